use serde::{Serialize, Deserialize};

use crate::data::pattern::{Feature, Pattern};
use crate::error::{Error, Result};

/// How class membership is turned into target vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetEncoding {
    /// Binary code of the class index in `ceil(log2(classes))` positions,
    /// least significant bit first. Two classes need a single output.
    Minimal,
    /// One position per class ("one-hot").
    Normal,
}

impl TargetEncoding {
    /// Number of target positions needed for `classes` classes.
    pub fn width(&self, classes: usize) -> usize {
        match self {
            TargetEncoding::Minimal => bits_for(classes),
            TargetEncoding::Normal => classes,
        }
    }

    /// The target pattern for class index `class` out of `classes`.
    pub fn encode(&self, class: usize, classes: usize, min: Feature, max: Feature) -> Result<Pattern> {
        match self {
            TargetEncoding::Minimal => make_target(class, bits_for(classes), min, max),
            TargetEncoding::Normal => {
                if class >= classes {
                    return Err(Error::TargetEncoding { class, width: classes });
                }
                let mut target = Pattern::new(classes, min);
                target[class] = max;
                Ok(target)
            }
        }
    }
}

/// `ceil(log2(n))`, with 0 for `n <= 1`.
fn bits_for(n: usize) -> usize {
    if n <= 1 {
        0
    } else {
        (usize::BITS - (n - 1).leading_zeros()) as usize
    }
}

/// Binary representation of `n` in `width` positions, least significant bit
/// first, using `max` for ones and `min` for zeros.
pub fn make_target(n: usize, width: usize, min: Feature, max: Feature) -> Result<Pattern> {
    let needed = bits_for(n + 1);
    if width < needed {
        return Err(Error::TargetEncoding { class: n, width });
    }
    let mut target = Pattern::new(width, min);
    let mut v = n;
    for i in 0..needed {
        if v % 2 == 1 {
            target[i] = max;
        }
        v /= 2;
    }
    Ok(target)
}
