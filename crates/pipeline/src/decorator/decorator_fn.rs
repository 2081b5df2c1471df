use crate::decorator::Decorator;
use std::fmt;

/// A [`Decorator`] backed by a closure.
#[derive(Copy, Clone)]
pub struct DecoratorFn<F> {
    f: F,
}

pub fn decorator_fn<In, Out, F>(f: F) -> DecoratorFn<F>
where
    F: Fn(In) -> Out,
{
    DecoratorFn { f }
}

impl<In, Out, F> Decorator<In> for DecoratorFn<F>
where
    F: Fn(In) -> Out,
{
    type Out = Out;

    fn decorate(&self, raw: In) -> Self::Out {
        (self.f)(raw)
    }
}

impl<F> fmt::Debug for DecoratorFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoratorFn").finish_non_exhaustive()
    }
}
