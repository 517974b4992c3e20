//! Execution plan builder
//!
//! A plan is the ordered list of classified, non-blank source lines for one
//! run. It is built once per Run and never mutated afterwards.

use super::classify::{classify, LineKind};
use crate::executor::{CodeExecutor, ExecError};
use serde::Serialize;

/// One physical line of the source, with its original 0-based index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLine {
    pub index: usize,
    pub text: String,
}

/// One executable unit: a classified, non-blank source line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    /// 0-based index of the line in the source buffer (not renumbered)
    pub line_number: usize,
    pub code: String,
    pub kind: LineKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionPlan {
    steps: Vec<Step>,
}

/// Non-blank lines of `source`, keeping their original indices
pub fn source_lines(source: &str) -> Vec<SourceLine> {
    source
        .lines()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(index, text)| SourceLine {
            index,
            text: text.to_string(),
        })
        .collect()
}

impl ExecutionPlan {
    /// Split, drop blank lines, classify. Pure: performs no validation.
    pub fn build(source: &str) -> Self {
        let steps = source_lines(source)
            .into_iter()
            .map(|line| Step {
                kind: classify(&line.text),
                line_number: line.index,
                code: line.text,
            })
            .collect();
        ExecutionPlan { steps }
    }

    /// Validate the whole source with `executor`, then build the plan.
    pub async fn validated<E>(source: &str, executor: &mut E) -> Result<Self, ExecError>
    where
        E: CodeExecutor + ?Sized,
    {
        executor.validate(source).await?;
        Ok(Self::build(source))
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }
}
