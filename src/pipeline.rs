//! Demand-driven pipeline: stages wrap an [`Algorithm`] and are connected
//! through [`OutputPort`]s. Calling [`Stage::update`] on the last stage pulls
//! data through everything upstream of it.

use crate::errors::FilterError;
use crate::polydata::PolyData;
use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic clock used to decide whether a stage is out of date.
static EXECUTION_CLOCK: AtomicU64 = AtomicU64::new(1);

fn tick() -> u64 {
    EXECUTION_CLOCK.fetch_add(1, Ordering::Relaxed)
}

/// A processing step with a fixed number of input and output ports.
pub trait Algorithm {
    fn name(&self) -> &str;

    fn number_of_input_ports(&self) -> usize;

    fn number_of_output_ports(&self) -> usize;

    /// Produce one `PolyData` per output port from one per input port.
    fn request_data(&mut self, inputs: &[&PolyData]) -> Result<Vec<PolyData>, FilterError>;
}

struct StageState {
    algorithm: Box<dyn Algorithm>,
    inputs: Vec<Option<OutputPort>>,
    outputs: Vec<PolyData>,
    modified_at: u64,
    executed_at: Option<u64>,
}

impl StageState {
    fn execute(&mut self) -> Result<u64, FilterError> {
        let name = self.algorithm.name().to_string();
        let mut newest_input = 0;
        let mut inputs = Vec::with_capacity(self.inputs.len());

        for (port, connection) in self.inputs.iter().enumerate() {
            let connection = connection
                .as_ref()
                .ok_or_else(|| FilterError::UnconnectedInput {
                    stage: name.clone(),
                    port,
                })?;
            let stamp = connection.stage.update()?;
            newest_input = newest_input.max(stamp);
            inputs.push(connection.stage.output(connection.index)?);
        }

        let stale = match self.executed_at {
            None => true,
            Some(t) => t < newest_input || t < self.modified_at,
        };

        if let (false, Some(t)) = (stale, self.executed_at) {
            tracing::trace!(stage = %name, "up to date");
            return Ok(t);
        }

        tracing::debug!(stage = %name, inputs = inputs.len(), "executing");
        let refs: Vec<&PolyData> = inputs.iter().collect();
        let outputs = self.algorithm.request_data(&refs)?;
        let expected = self.algorithm.number_of_output_ports();
        if outputs.len() != expected {
            return Err(FilterError::OutputCount {
                stage: name,
                expected,
                got: outputs.len(),
            });
        }

        let stamp = tick();
        self.outputs = outputs;
        self.executed_at = Some(stamp);
        Ok(stamp)
    }
}

/// Shared handle to an algorithm placed in a pipeline.
#[derive(Clone)]
pub struct Stage {
    inner: Rc<RefCell<StageState>>,
}

/// Output `index` of `stage`.
#[derive(Clone)]
pub struct OutputPort {
    stage: Stage,
    index: usize,
}

impl OutputPort {
    pub const fn index(&self) -> usize {
        self.index
    }

    pub const fn stage(&self) -> &Stage {
        &self.stage
    }
}

impl Debug for OutputPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputPort")
            .field("stage", &self.stage.name())
            .field("index", &self.index)
            .finish()
    }
}

impl Stage {
    pub fn new<A: Algorithm + 'static>(algorithm: A) -> Self {
        let inputs = vec![None; algorithm.number_of_input_ports()];
        Self {
            inner: Rc::new(RefCell::new(StageState {
                algorithm: Box::new(algorithm),
                inputs,
                outputs: Vec::new(),
                modified_at: tick(),
                executed_at: None,
            })),
        }
    }

    /// Stage serving `data` on its single output port.
    pub fn from_data(data: PolyData) -> Self {
        Self::new(DataProducer::new(data))
    }

    pub fn name(&self) -> String {
        match self.inner.try_borrow() {
            Ok(state) => state.algorithm.name().to_string(),
            Err(_) => "<busy>".to_string(),
        }
    }

    pub fn output_port(&self, index: usize) -> OutputPort {
        OutputPort {
            stage: self.clone(),
            index,
        }
    }

    /// Whether `self` is `other` or feeds into it, directly or indirectly.
    fn is_upstream_of(&self, other: &Stage) -> bool {
        if Rc::ptr_eq(&self.inner, &other.inner) {
            return true;
        }
        match other.inner.try_borrow() {
            Ok(state) => state
                .inputs
                .iter()
                .flatten()
                .any(|port| self.is_upstream_of(&port.stage)),
            Err(_) => true,
        }
    }

    /// Connect input `port` to `output`. Connections that would close a loop
    /// are refused.
    pub fn set_input_connection(&self, port: usize, output: OutputPort) -> Result<(), FilterError> {
        if self.is_upstream_of(&output.stage) {
            return Err(FilterError::Cycle(self.name()));
        }

        let mut state = self.inner.borrow_mut();
        let count = state.inputs.len();
        let name = state.algorithm.name().to_string();
        let slot = state
            .inputs
            .get_mut(port)
            .ok_or(FilterError::InvalidInputPort {
                stage: name,
                port,
                count,
            })?;
        *slot = Some(output);
        state.modified_at = tick();
        Ok(())
    }

    /// Force re-execution on the next update.
    pub fn modified(&self) {
        self.inner.borrow_mut().modified_at = tick();
    }

    /// Bring this stage up to date and return the time it last executed.
    /// A failed update leaves the stage without outputs.
    pub fn update(&self) -> Result<u64, FilterError> {
        let mut state = self
            .inner
            .try_borrow_mut()
            .map_err(|_| FilterError::Cycle(self.name()))?;

        let result = state.execute();
        if result.is_err() {
            state.outputs.clear();
            state.executed_at = None;
        }
        result
    }

    /// Copy of output `index` as produced by the last update.
    pub fn output(&self, index: usize) -> Result<PolyData, FilterError> {
        let state = self
            .inner
            .try_borrow()
            .map_err(|_| FilterError::Cycle("<busy>".to_string()))?;
        if state.executed_at.is_none() {
            return Err(FilterError::NoOutput(state.algorithm.name().to_string()));
        }
        state
            .outputs
            .get(index)
            .cloned()
            .ok_or_else(|| FilterError::InvalidOutputPort {
                stage: state.algorithm.name().to_string(),
                port: index,
                count: state.algorithm.number_of_output_ports(),
            })
    }

    /// Update, then return output `index`.
    pub fn update_and_output(&self, index: usize) -> Result<PolyData, FilterError> {
        self.update()?;
        self.output(index)
    }
}

/// Source stage with fixed data, used to feed existing `PolyData` into a pipeline.
#[derive(Debug, Clone)]
pub struct DataProducer {
    data: PolyData,
}

impl DataProducer {
    pub const fn new(data: PolyData) -> Self {
        Self { data }
    }
}

impl Algorithm for DataProducer {
    fn name(&self) -> &str {
        "DataProducer"
    }

    fn number_of_input_ports(&self) -> usize {
        0
    }

    fn number_of_output_ports(&self) -> usize {
        1
    }

    fn request_data(&mut self, _inputs: &[&PolyData]) -> Result<Vec<PolyData>, FilterError> {
        Ok(vec![self.data.clone()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Counts executions and forwards its input with one extra point.
    struct Counter {
        runs: Rc<Cell<usize>>,
    }

    impl Algorithm for Counter {
        fn name(&self) -> &str {
            "Counter"
        }

        fn number_of_input_ports(&self) -> usize {
            1
        }

        fn number_of_output_ports(&self) -> usize {
            1
        }

        fn request_data(&mut self, inputs: &[&PolyData]) -> Result<Vec<PolyData>, FilterError> {
            self.runs.set(self.runs.get() + 1);
            let mut out = inputs[0].clone();
            out.add_point(nalgebra::Point3::origin());
            Ok(vec![out])
        }
    }

    #[test]
    fn executes_once_until_modified() {
        let runs = Rc::new(Cell::new(0));
        let source = Stage::from_data(PolyData::new());
        let counter = Stage::new(Counter { runs: runs.clone() });
        counter.set_input_connection(0, source.output_port(0)).unwrap();

        counter.update().unwrap();
        counter.update().unwrap();
        assert_eq!(runs.get(), 1);
        assert_eq!(counter.output(0).unwrap().number_of_points(), 1);

        source.modified();
        counter.update().unwrap();
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn unconnected_input_is_an_error() {
        let counter = counting_stage();
        assert!(matches!(
            counter.update(),
            Err(FilterError::UnconnectedInput { port: 0, .. })
        ));
    }

    fn counting_stage() -> Stage {
        Stage::new(Counter {
            runs: Rc::new(Cell::new(0)),
        })
    }

    #[test]
    fn cyclic_connections_are_refused() {
        let first = counting_stage();
        assert!(matches!(
            first.set_input_connection(0, first.output_port(0)),
            Err(FilterError::Cycle(_))
        ));
        // nothing holds on to the stage besides its handle
        assert_eq!(Rc::strong_count(&first.inner), 1);

        let second = counting_stage();
        second.set_input_connection(0, first.output_port(0)).unwrap();
        assert!(matches!(
            first.set_input_connection(0, second.output_port(0)),
            Err(FilterError::Cycle(_))
        ));
        assert!(matches!(
            first.update(),
            Err(FilterError::UnconnectedInput { port: 0, .. })
        ));
    }

    /// Forwards its input or fails, as told.
    struct Switch {
        fail: Rc<Cell<bool>>,
    }

    impl Algorithm for Switch {
        fn name(&self) -> &str {
            "Switch"
        }

        fn number_of_input_ports(&self) -> usize {
            1
        }

        fn number_of_output_ports(&self) -> usize {
            1
        }

        fn request_data(&mut self, inputs: &[&PolyData]) -> Result<Vec<PolyData>, FilterError> {
            if self.fail.get() {
                return Err(FilterError::InvalidParameter("switched off".to_string()));
            }
            Ok(vec![inputs[0].clone()])
        }
    }

    #[test]
    fn failed_update_drops_previous_outputs() {
        let fail = Rc::new(Cell::new(false));
        let source = Stage::from_data(PolyData::new());
        let switch = Stage::new(Switch { fail: fail.clone() });
        switch.set_input_connection(0, source.output_port(0)).unwrap();

        assert!(matches!(switch.output(0), Err(FilterError::NoOutput(_))));
        switch.update().unwrap();
        assert!(switch.output(0).is_ok());

        fail.set(true);
        switch.modified();
        assert!(switch.update().is_err());
        assert!(matches!(switch.output(0), Err(FilterError::NoOutput(_))));

        // the next good run restores them
        fail.set(false);
        switch.update().unwrap();
        assert!(switch.output(0).is_ok());
    }

    #[test]
    fn bad_ports_are_rejected() {
        let source = Stage::from_data(PolyData::new());
        let counter = counting_stage();
        assert!(matches!(
            counter.set_input_connection(1, source.output_port(0)),
            Err(FilterError::InvalidInputPort { port: 1, count: 1, .. })
        ));

        counter.set_input_connection(0, source.output_port(3)).unwrap();
        assert!(matches!(
            counter.update(),
            Err(FilterError::InvalidOutputPort { port: 3, .. })
        ));
    }
}
