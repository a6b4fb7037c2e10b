//! Trace comparison
//!
//! Two captures of the same bus traffic are compared by their rendered
//! transactions. Acknowledge bits can be left out of the comparison, which is
//! useful when one capture point sees ACK glitches the other does not.

use i2c_trace_decoder::Transaction;
use std::fmt;

/// First transaction where two traces disagree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub index: usize,
    /// Rendering from the first trace (None if it has fewer transactions)
    pub left: Option<String>,
    /// Rendering from the second trace (None if it has fewer transactions)
    pub right: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub left_count: usize,
    pub right_count: usize,
    pub first_mismatch: Option<Mismatch>,
}

impl Comparison {
    pub fn is_match(&self) -> bool {
        self.first_mismatch.is_none()
    }
}

pub fn compare(left: &[Transaction], right: &[Transaction], ignore_ack: bool) -> Comparison {
    let render = |t: Option<&Transaction>| t.map(|t| t.render(ignore_ack));

    let first_mismatch = (0..left.len().max(right.len())).find_map(|index| {
        let l = render(left.get(index));
        let r = render(right.get(index));
        (l != r).then_some(Mismatch {
            index,
            left: l,
            right: r,
        })
    });

    Comparison {
        left_count: left.len(),
        right_count: right.len(),
        first_mismatch,
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.first_mismatch {
            None => write!(f, "Traces match ({} transactions)", self.left_count),
            Some(mismatch) => {
                writeln!(
                    f,
                    "Traces differ at transaction {} ({} vs {} transactions)",
                    mismatch.index, self.left_count, self.right_count
                )?;
                writeln!(f, "< {}", mismatch.left.as_deref().unwrap_or("(none)"))?;
                write!(f, "> {}", mismatch.right.as_deref().unwrap_or("(none)"))
            }
        }
    }
}
