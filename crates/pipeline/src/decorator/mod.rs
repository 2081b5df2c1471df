//! Handler decorators.
//!
//! A [`Decorator`] turns one handler into another, typically by wrapping it. The pipeline
//! stacks decorators around its routing handler, which is how request-level middleware such
//! as slash normalization is installed.

mod decorator_fn;

pub use decorator_fn::{DecoratorFn, decorator_fn};

pub trait Decorator<In> {
    type Out;

    fn decorate(&self, raw: In) -> Self::Out;
}
