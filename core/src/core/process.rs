// stepwise/src/core/process.rs

//! The processing collaborator: the opaque transformation a step applies to its input.

use crate::core::params::ParameterSet;
use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;

/// A step's processing. The engine never looks inside the payload `P`; it only
/// threads it from one node to the next.
///
/// Errors are plain `anyhow::Error`s; the engine wraps them into
/// `StepwiseError::ProcessingFailure` together with the node's dotted path.
#[async_trait]
pub trait Process<P>: Send + Sync
where
  P: Send + 'static,
{
  async fn process(&self, input: P, params: &ParameterSet) -> anyhow::Result<P>;
}

/// Hands its input back untouched. Default processing for pipelines, whose
/// real work is done by their children.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

#[async_trait]
impl<P> Process<P> for Passthrough
where
  P: Send + 'static,
{
  async fn process(&self, input: P, _params: &ParameterSet) -> anyhow::Result<P> {
    Ok(input)
  }
}

/// Adapter turning a synchronous closure into a `Process`.
pub struct FnProcess<P, F> {
  f: F,
  _payload: PhantomData<fn(P) -> P>,
}

#[async_trait]
impl<P, F> Process<P> for FnProcess<P, F>
where
  P: Send + 'static,
  F: Fn(P, &ParameterSet) -> anyhow::Result<P> + Send + Sync,
{
  async fn process(&self, input: P, params: &ParameterSet) -> anyhow::Result<P> {
    (self.f)(input, params)
  }
}

/// Wraps a synchronous closure as a shareable processor.
pub fn process_fn<P, F>(f: F) -> Arc<dyn Process<P>>
where
  P: Send + 'static,
  F: Fn(P, &ParameterSet) -> anyhow::Result<P> + Send + Sync + 'static,
{
  Arc::new(FnProcess {
    f,
    _payload: PhantomData,
  })
}
