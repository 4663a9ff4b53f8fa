//! Computation-mode state machine
//!
//! ```text
//! Created --configure--> Configured --compute--> Accumulating --finalize_compute--> Finalized
//!                            |  ^                   |  ^
//!                            |  +--configure        +--compute / merge_partial
//!                            +--compute (Batch)---------------------------------> Finalized
//! ```

use super::traits::{BatchAlgorithm, OnlineAlgorithm, Parameter};
use crate::error::{Error, Status};
use crate::runtime::cpu::CpuEnv;
use std::fmt;

/// How a session turns inputs into a result
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ComputeMode {
    /// One `compute` call produces the result
    Batch,
    /// Blocks are accumulated until `finalize_compute`
    Online,
    /// Like `Online`, and partial results of other nodes can be merged
    Distributed,
}

/// Lifecycle state of a session
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No parameter bound yet
    Created,
    /// Parameter bound, nothing computed
    Configured,
    /// At least one block or partial result accumulated
    Accumulating,
    /// Result produced; terminal
    Finalized,
}

impl SessionState {
    /// State name used in errors
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Configured => "configured",
            Self::Accumulating => "accumulating",
            Self::Finalized => "finalized",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn invalid_state(op: &'static str, state: SessionState) -> Error {
    Error::InvalidState {
        op,
        state: state.as_str(),
    }
}

/// Session running an [`OnlineAlgorithm`] in any [`ComputeMode`]
pub struct Session<A: OnlineAlgorithm> {
    mode: ComputeMode,
    method: A::Method,
    parameter: A::Parameter,
    env: CpuEnv,
    state: SessionState,
    partial: A::PartialResult,
    result: Option<A::Result>,
}

impl<A: OnlineAlgorithm> Session<A> {
    /// Session for `mode` and `method` on the default environment
    pub fn new(mode: ComputeMode, method: A::Method) -> Self {
        Self::with_env(mode, method, CpuEnv::new())
    }

    /// Session for `mode` and `method` on `env`
    pub fn with_env(mode: ComputeMode, method: A::Method, env: CpuEnv) -> Self {
        Self {
            mode,
            method,
            parameter: A::Parameter::default(),
            env,
            state: SessionState::Created,
            partial: A::PartialResult::default(),
            result: None,
        }
    }

    /// Computation mode
    pub fn mode(&self) -> ComputeMode {
        self.mode
    }

    /// Computation method
    pub fn method(&self) -> A::Method {
        self.method
    }

    /// Bound parameter
    pub fn parameter(&self) -> &A::Parameter {
        &self.parameter
    }

    /// Execution environment
    pub fn env(&self) -> &CpuEnv {
        &self.env
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Accumulated state
    pub fn partial_result(&self) -> &A::PartialResult {
        &self.partial
    }

    /// Result, once finalized
    pub fn result(&self) -> Option<&A::Result> {
        self.result.as_ref()
    }

    /// Move the result out of a finalized session
    pub fn take_result(&mut self) -> Option<A::Result> {
        self.result.take()
    }

    /// Bind a validated parameter; allowed before anything is computed
    pub fn configure(&mut self, parameter: A::Parameter) -> Status {
        if !matches!(self.state, SessionState::Created | SessionState::Configured) {
            return Err(invalid_state("configure", self.state));
        }
        parameter.check()?;
        self.parameter = parameter;
        self.state = SessionState::Configured;
        Ok(())
    }

    /// Process one block
    ///
    /// In `Batch` mode the block is the whole input and the session is
    /// finalized on success. Otherwise the block is appended to the partial
    /// result. On failure nothing changes.
    ///
    /// Each online block re-checks every accumulated block's factors before
    /// it is appended, so a session of `k` blocks performs O(k²) table
    /// checks in total. Prefer fewer, larger blocks when `k` grows large.
    pub fn compute(&mut self, input: &A::Input) -> Status {
        match (self.mode, self.state) {
            (ComputeMode::Batch, SessionState::Configured) => {}
            (ComputeMode::Online | ComputeMode::Distributed, SessionState::Configured)
            | (ComputeMode::Online | ComputeMode::Distributed, SessionState::Accumulating) => {}
            (_, state) => return Err(invalid_state("compute", state)),
        }

        A::check_input(input, &self.parameter, self.method)?;

        if self.mode == ComputeMode::Batch {
            let mut partial = A::PartialResult::default();
            let block = A::compute_block(&self.env, input, &self.parameter, self.method)?;
            A::accumulate(&mut partial, block);
            A::check_partial(&partial, None, &self.parameter, self.method)?;
            let result = A::finalize(&self.env, &partial, &self.parameter, self.method)?;
            log::debug!("{}: batch compute finished", A::NAME);
            self.result = Some(result);
            self.state = SessionState::Finalized;
            return Ok(());
        }

        A::check_partial(&self.partial, Some(input), &self.parameter, self.method)?;
        let block = A::compute_block(&self.env, input, &self.parameter, self.method)?;
        A::accumulate(&mut self.partial, block);
        self.state = SessionState::Accumulating;
        log::debug!("{}: block accumulated", A::NAME);
        Ok(())
    }

    /// Fold a partial result produced by another node (`Distributed` only)
    pub fn merge_partial(&mut self, other: &A::PartialResult) -> Status {
        if self.mode != ComputeMode::Distributed {
            return Err(invalid_state("merge_partial", self.state));
        }
        if !matches!(self.state, SessionState::Configured | SessionState::Accumulating) {
            return Err(invalid_state("merge_partial", self.state));
        }
        A::check_partial(other, None, &self.parameter, self.method)?;
        A::merge(&mut self.partial, other, &self.parameter, self.method)?;
        self.state = SessionState::Accumulating;
        log::debug!("{}: partial result merged", A::NAME);
        Ok(())
    }

    /// Validate the accumulated state and produce the result
    ///
    /// Fails without a state change if nothing was accumulated or the state
    /// is inconsistent; the session can then take further blocks.
    pub fn finalize_compute(&mut self) -> Status {
        if self.mode == ComputeMode::Batch
            || !matches!(self.state, SessionState::Configured | SessionState::Accumulating)
        {
            return Err(invalid_state("finalize_compute", self.state));
        }
        A::check_partial(&self.partial, None, &self.parameter, self.method)?;
        let result = A::finalize(&self.env, &self.partial, &self.parameter, self.method)?;
        log::debug!("{}: finalized", A::NAME);
        self.result = Some(result);
        self.state = SessionState::Finalized;
        Ok(())
    }
}

impl<A: OnlineAlgorithm> Clone for Session<A> {
    /// Fresh session with the same mode, method, parameter and environment.
    /// Accumulated state and results are not copied.
    fn clone(&self) -> Self {
        let mut session = Self::with_env(self.mode, self.method, self.env);
        session.parameter = self.parameter.clone();
        if self.state != SessionState::Created {
            session.state = SessionState::Configured;
        }
        session
    }
}

impl<A: OnlineAlgorithm> fmt::Debug for Session<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("algorithm", &A::NAME)
            .field("mode", &self.mode)
            .field("method", &self.method)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Session running a [`BatchAlgorithm`]
pub struct BatchSession<A: BatchAlgorithm> {
    method: A::Method,
    parameter: A::Parameter,
    env: CpuEnv,
    state: SessionState,
    result: Option<A::Result>,
}

impl<A: BatchAlgorithm> BatchSession<A> {
    /// Session for `method` on the default environment
    pub fn new(method: A::Method) -> Self {
        Self::with_env(method, CpuEnv::new())
    }

    /// Session for `method` on `env`
    pub fn with_env(method: A::Method, env: CpuEnv) -> Self {
        Self {
            method,
            parameter: A::Parameter::default(),
            env,
            state: SessionState::Created,
            result: None,
        }
    }

    /// Computation method
    pub fn method(&self) -> A::Method {
        self.method
    }

    /// Bound parameter
    pub fn parameter(&self) -> &A::Parameter {
        &self.parameter
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Result of the last successful `compute`
    pub fn result(&self) -> Option<&A::Result> {
        self.result.as_ref()
    }

    /// Move the result out of the session
    pub fn take_result(&mut self) -> Option<A::Result> {
        self.result.take()
    }

    /// Bind a validated parameter
    pub fn configure(&mut self, parameter: A::Parameter) -> Status {
        if self.state != SessionState::Created && self.state != SessionState::Configured {
            return Err(invalid_state("configure", self.state));
        }
        parameter.check()?;
        self.parameter = parameter;
        self.state = SessionState::Configured;
        Ok(())
    }

    /// Validate the input, compute and validate the result
    pub fn compute(&mut self, input: &A::Input) -> Status {
        if self.state != SessionState::Configured {
            return Err(invalid_state("compute", self.state));
        }
        A::check_input(input, &self.parameter, self.method)?;
        let result = A::compute(&self.env, input, &self.parameter, self.method)?;
        A::check_result(&result, input, &self.parameter, self.method)?;
        log::debug!("{}: batch compute finished", A::NAME);
        self.result = Some(result);
        self.state = SessionState::Finalized;
        Ok(())
    }
}

impl<A: BatchAlgorithm> Clone for BatchSession<A> {
    /// Fresh session with the same method, parameter and environment
    fn clone(&self) -> Self {
        let mut session = Self::with_env(self.method, self.env);
        session.parameter = self.parameter.clone();
        if self.state != SessionState::Created {
            session.state = SessionState::Configured;
        }
        session
    }
}

impl<A: BatchAlgorithm> fmt::Debug for BatchSession<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchSession")
            .field("algorithm", &A::NAME)
            .field("method", &self.method)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
