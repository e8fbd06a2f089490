// stepwise/src/pipeline/execution.rs

//! Contains `StepTree::execute()`, which walks the tree in declaration order,
//! runs each node's processing, and persists results through a `DataStore`.

use crate::core::control::{Artifact, ExecutionReport};
use crate::core::step::StepKind;
use crate::core::store::DataStore;
use crate::error::{StepwiseError, StepwiseResult};
use crate::pipeline::output::{OutputResolver, WorkingStem};
use crate::pipeline::tree::{NodeId, StepTree};
use std::future::Future;
use std::pin::Pin;
use tracing::{event, instrument, span, Instrument, Level};

type NodeFuture<'a, P> = Pin<Box<dyn Future<Output = StepwiseResult<P>> + Send + 'a>>;

/// Mutable state of one walk: the working stem (written only by the node
/// currently executing) and the artifacts saved so far.
struct RunState {
  stem: WorkingStem,
  artifacts: Vec<Artifact>,
}

impl<P> StepTree<P>
where
  P: Send + Sync + 'static,
{
  /// Loads the input through `store` and executes the whole tree.
  pub async fn run<S>(&self, store: &S) -> StepwiseResult<ExecutionReport<P>>
  where
    S: DataStore<Payload = P>,
  {
    let input = store.load(self.input()).await.map_err(|source| StepwiseError::LoadFailure {
      path: self.input().to_path_buf(),
      source,
    })?;
    self.execute(input, store).await
  }

  /// Executes the tree on an already loaded input.
  ///
  /// Nodes run one at a time, depth-first, in declaration order. The first
  /// processing or save failure stops the walk; artifacts saved before it are
  /// left where they are.
  #[instrument(
    name = "StepTree::execute",
    skip_all,
    fields(root = %self.root().path(), nodes = self.len()),
    err(Display)
  )]
  pub async fn execute<S>(&self, input: P, store: &S) -> StepwiseResult<ExecutionReport<P>>
  where
    S: DataStore<Payload = P>,
  {
    let output = OutputResolver::new(self);
    let mut state = RunState {
      stem: output.initial_stem(),
      artifacts: Vec::new(),
    };
    event!(Level::DEBUG, stem = state.stem.stem(), "Execution starting.");

    let result = self.run_node(NodeId::ROOT, input, &output, store, &mut state).await?;

    event!(Level::DEBUG, artifacts = state.artifacts.len(), "Execution completed successfully.");
    Ok(ExecutionReport {
      output: result,
      artifacts: state.artifacts,
    })
  }

  fn run_node<'a, S>(
    &'a self,
    id: NodeId,
    input: P,
    output: &'a OutputResolver<'a, P>,
    store: &'a S,
    state: &'a mut RunState,
  ) -> NodeFuture<'a, P>
  where
    S: DataStore<Payload = P>,
  {
    let node = self.node(id);
    let node_span = span!(
      Level::INFO,
      "step_execution",
      step = node.path(),
      step_type = node.def().type_name()
    );

    Box::pin(
      async move {
        let params = node.params();

        if !node.is_root() && params.skip() {
          event!(Level::INFO, "Step skipped; passing input through.");
          return Ok(input);
        }

        let mut data = input;
        if node.kind() == StepKind::Composite {
          output.enter(id, &mut state.stem);
          for child in node.children() {
            data = self.run_node(*child, data, output, store, state).await?;
          }
        }

        event!(Level::DEBUG, "Processing.");
        data = node
          .def()
          .processor
          .process(data, params)
          .await
          .map_err(|source| {
            event!(Level::ERROR, error = %source, "Processing failed.");
            StepwiseError::ProcessingFailure {
              step_path: node.path().to_string(),
              source,
            }
          })?;

        if output.should_persist(id) {
          let target = output.target(id, &state.stem);
          event!(
            Level::INFO,
            dir = %target.dir.display(),
            file = %target.filename,
            "Saving step result."
          );
          let written = store
            .save(&data, &target.dir, &target.filename)
            .await
            .map_err(|source| {
              event!(Level::ERROR, error = %source, "Save failed.");
              StepwiseError::SaveFailure {
                step_path: node.path().to_string(),
                path: target.path(),
                source,
              }
            })?;
          state.artifacts.push(Artifact {
            step_path: node.path().to_string(),
            path: written,
          });
        }

        output.advance(id, &mut state.stem);
        event!(Level::TRACE, stem = state.stem.stem(), "Step finished.");
        Ok(data)
      }
      .instrument(node_span),
    )
  }
}
