pub mod config;
pub mod presets;

use log::warn;

use crate::error::{BkwError, Result};

pub use config::{ReductionConfig, ReductionConfigBuilder};

/// Largest number of positions a single smooth-LMS step may categorize
/// (the extra p1 position not included).
pub const MAX_SMOOTH_LMS_POSITIONS: usize = 10;

/// Which mapping regime a step uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepKind {
    /// No previous step: every position is fresh, plus the p1 position.
    First,
    /// Position 0 continues the previous p1 position, plus the p1 position.
    Middle,
    /// Position 0 continues the previous p1 position; the block ends at n.
    Last,
}

/// Parameters of one reduction step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepParams {
    /// First coordinate of the block categorized by this step.
    pub start_index: usize,
    /// Number of positions in the block (Ni).
    pub num_positions: usize,
    /// General reduction factor.
    pub p: u16,
    /// Reduction factor for the extra position Ni+1.
    pub p1: u16,
    /// Reduction factor for position 0 when it continues a previous p1 position.
    pub p2: u16,
    /// p1 of the previous step; `None` on the first step.
    pub prev_p1: Option<u16>,
    /// Bound on the centered value of every eliminated coordinate; `None` disables.
    pub selection_bound: Option<u16>,
}

impl StepParams {
    pub fn kind(&self, n: usize) -> StepKind {
        match self.prev_p1 {
            None => StepKind::First,
            Some(_) if self.start_index + self.num_positions == n => StepKind::Last,
            Some(_) => StepKind::Middle,
        }
    }

    /// Number of coordinates the step maps (including the p1 position when present).
    pub fn mapped_positions(&self, n: usize) -> usize {
        match self.kind(n) {
            StepKind::Last => self.num_positions,
            StepKind::First | StepKind::Middle => self.num_positions + 1,
        }
    }

    /// End (exclusive) of the coordinate range eliminated once samples are
    /// combined within this step's categories.
    pub fn eliminated_end(&self) -> usize {
        self.start_index + self.num_positions
    }

    pub fn validate(&self, n: usize, q: u16) -> Result<()> {
        if self.num_positions == 0 || self.num_positions > MAX_SMOOTH_LMS_POSITIONS {
            return Err(BkwError::InvalidParam(format!(
                "step covers {} positions, allowed 1..={}",
                self.num_positions, MAX_SMOOTH_LMS_POSITIONS
            )));
        }
        if self.p == 0 || self.p1 == 0 {
            return Err(BkwError::InvalidParam("smooth-LMS p and p1 must be non-zero".into()));
        }
        if self.p2 == 0 {
            return Err(BkwError::InvalidParam("smooth-LMS p2 parameter not valid".into()));
        }
        if let Some(prev) = self.prev_p1 {
            if prev == 0 || prev > q {
                return Err(BkwError::InvalidParam(format!("prev_p1 = {prev} outside 1..={q}")));
            }
        }
        let end = self.start_index + self.mapped_positions(n);
        if end > n {
            return Err(BkwError::InvalidParam(format!(
                "step at {} maps positions up to {} but n = {}",
                self.start_index, end, n
            )));
        }
        Ok(())
    }
}

/// An ordered list of step parameters for one attack run.
#[derive(Clone, Debug)]
pub struct Schedule {
    pub steps: Vec<StepParams>,
}

impl Schedule {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, i: usize) -> Option<&StepParams> {
        self.steps.get(i)
    }

    pub fn last(&self) -> Option<&StepParams> {
        self.steps.last()
    }
}

/// Builder assembling a schedule from per-step arrays.
pub struct ScheduleBuilder {
    n: usize,
    q: u16,
    start_index: Vec<usize>,
    len_step: Vec<usize>,
    p: Vec<u16>,
    p1: Vec<u16>,
    p2: Vec<u16>,
    prev_p1: Vec<Option<u16>>,
    selection: Vec<u16>,
}

impl ScheduleBuilder {
    pub fn new(n: usize, q: u16) -> Self {
        Self {
            n,
            q,
            start_index: Vec::new(),
            len_step: Vec::new(),
            p: Vec::new(),
            p1: Vec::new(),
            p2: Vec::new(),
            prev_p1: Vec::new(),
            selection: Vec::new(),
        }
    }

    pub fn start_index(mut self, v: &[usize]) -> Self {
        self.start_index = v.to_vec();
        self
    }

    pub fn len_step(mut self, v: &[usize]) -> Self {
        self.len_step = v.to_vec();
        self
    }

    pub fn p(mut self, v: &[u16]) -> Self {
        self.p = v.to_vec();
        self
    }

    pub fn p1(mut self, v: &[u16]) -> Self {
        self.p1 = v.to_vec();
        self
    }

    /// Optional; defaults to `p` per step.
    pub fn p2(mut self, v: &[u16]) -> Self {
        self.p2 = v.to_vec();
        self
    }

    pub fn prev_p1(mut self, v: &[Option<u16>]) -> Self {
        self.prev_p1 = v.to_vec();
        self
    }

    /// Optional; 0 disables the filter for that step.
    pub fn selection(mut self, v: &[u16]) -> Self {
        self.selection = v.to_vec();
        self
    }

    pub fn build(self) -> Result<Schedule> {
        let steps = self.start_index.len();
        if steps == 0 {
            return Err(BkwError::InvalidParam("schedule has no steps".into()));
        }
        let check = |name: &str, len: usize, optional: bool| -> Result<()> {
            if len == steps || (optional && len == 0) {
                Ok(())
            } else {
                Err(BkwError::InvalidParam(format!("{name} has {len} entries, expected {steps}")))
            }
        };
        check("len_step", self.len_step.len(), false)?;
        check("p", self.p.len(), false)?;
        check("p1", self.p1.len(), false)?;
        check("p2", self.p2.len(), true)?;
        check("prev_p1", self.prev_p1.len(), false)?;
        check("selection", self.selection.len(), true)?;

        let mut out = Vec::with_capacity(steps);
        for i in 0..steps {
            let step = StepParams {
                start_index: self.start_index[i],
                num_positions: self.len_step[i],
                p: self.p[i],
                p1: self.p1[i],
                p2: if self.p2.is_empty() { self.p[i] } else { self.p2[i] },
                prev_p1: self.prev_p1[i],
                selection_bound: self.selection.get(i).copied().filter(|&b| b != 0),
            };
            step.validate(self.n, self.q)?;
            out.push(step);
        }

        for (i, w) in out.windows(2).enumerate() {
            if w[1].start_index != w[0].eliminated_end() {
                warn!(
                    "step {} starts at {}, previous block ends at {}",
                    i + 1,
                    w[1].start_index,
                    w[0].eliminated_end()
                );
            }
            if w[1].prev_p1.is_some() && w[1].prev_p1 != Some(w[0].p1) {
                warn!("step {} prev_p1 {:?} differs from previous p1 {}", i + 1, w[1].prev_p1, w[0].p1);
            }
        }

        Ok(Schedule { steps: out })
    }
}
