use itertools::Itertools;

/// Classification of a diff segment, seen from the actual output
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Change {
    /// Present in the expected text only
    Added,
    /// Present in the actual text only
    Removed,
    Unchanged,
}

impl Change {
    pub fn inverse(self) -> Change {
        match self {
            Self::Added => Self::Removed,
            Self::Removed => Self::Added,
            Self::Unchanged => Self::Unchanged,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub change: Change,
    pub value: String,
}

impl Segment {
    pub fn new(change: Change, value: &str) -> Segment {
        Segment {
            change,
            value: value.to_owned(),
        }
    }
}

/// Character level diff from `actual` to `expected`
///
/// Adjacent characters with the same classification are merged into one
/// segment. Swapping the arguments swaps `Added` and `Removed`, also when
/// several alignments are equally short: the pair is always diffed in the
/// same order and the result inverted when needed.
pub fn diff_chars(actual: &str, expected: &str) -> Vec<Segment> {
    if actual <= expected {
        ordered_diff(actual, expected)
    } else {
        ordered_diff(expected, actual)
            .into_iter()
            .map(|segment| Segment::new(segment.change.inverse(), &segment.value))
            .collect()
    }
}

fn ordered_diff(left: &str, right: &str) -> Vec<Segment> {
    diff::chars(left, right)
        .into_iter()
        .map(|result| match result {
            diff::Result::Left(c) => (Change::Removed, c),
            diff::Result::Right(c) => (Change::Added, c),
            diff::Result::Both(c, _) => (Change::Unchanged, c),
        })
        .map(|(change, c)| Segment::new(change, c.encode_utf8(&mut [0; 4])))
        .coalesce(|mut prev, next| {
            if prev.change == next.change {
                prev.value.push_str(&next.value);
                Ok(prev)
            } else {
                Err((prev, next))
            }
        })
        .collect()
}
