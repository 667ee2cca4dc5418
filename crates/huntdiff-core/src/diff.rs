//! Character-level text diff with semantic cleanup, used for rule sources.
//!
//! The raw diff is Myers' O(ND) shortest edit script over `char`s, after
//! trimming the common prefix and suffix, found by the linear-space
//! middle-snake bisection. Cleanup then folds short
//! equalities sandwiched between edits into those edits so the output reads
//! as whole-word changes rather than scattered single-character matches.

use std::fmt::Write as _;

use serde::Serialize;

/// Steps searched from each end of a section before it is reported as one
/// delete plus one insert.
const MAX_EDIT_DISTANCE: usize = 4_000;

pub const NO_SOURCE_MARKER: &str = "<em>No rule source available for both hunts</em>";

const DELETE_STYLE: &str = "background-color:#ffdce0;";
const INSERT_STYLE: &str = "background-color:#e6ffed;";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffOp {
    Equal,
    Insert,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffSpan {
    pub op: DiffOp,
    pub text: String,
}

impl DiffSpan {
    fn new(op: DiffOp, text: impl Into<String>) -> Self {
        Self {
            op,
            text: text.into(),
        }
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Diff `old` against `new`.
///
/// Concatenating the equal and delete spans yields `old`; the equal and
/// insert spans yield `new`. Adjacent spans never share an op, and within
/// a run of edits the delete comes before the insert.
#[must_use]
pub fn diff(old: &str, new: &str) -> Vec<DiffSpan> {
    if old == new {
        return if old.is_empty() {
            Vec::new()
        } else {
            vec![DiffSpan::new(DiffOp::Equal, old)]
        };
    }

    let a: Vec<char> = old.chars().collect();
    let b: Vec<char> = new.chars().collect();
    cleanup_semantic(merge(diff_chars(&a, &b)))
}

fn collect(chars: &[char]) -> String {
    chars.iter().collect()
}

/// Raw edit script: trim the shared prefix and suffix, diff the middle.
fn diff_chars(a: &[char], b: &[char]) -> Vec<DiffSpan> {
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();

    let mut spans = Vec::new();
    if prefix > 0 {
        spans.push(DiffSpan::new(DiffOp::Equal, collect(&a[..prefix])));
    }
    spans.extend(diff_middle(
        &a[prefix..a.len() - suffix],
        &b[prefix..b.len() - suffix],
    ));
    if suffix > 0 {
        spans.push(DiffSpan::new(DiffOp::Equal, collect(&a[a.len() - suffix..])));
    }
    spans
}

fn replace_all(a: &[char], b: &[char]) -> Vec<DiffSpan> {
    vec![
        DiffSpan::new(DiffOp::Delete, collect(a)),
        DiffSpan::new(DiffOp::Insert, collect(b)),
    ]
}

fn diff_middle(a: &[char], b: &[char]) -> Vec<DiffSpan> {
    match (a.len(), b.len()) {
        (0, 0) => Vec::new(),
        (0, _) => vec![DiffSpan::new(DiffOp::Insert, collect(b))],
        (_, 0) => vec![DiffSpan::new(DiffOp::Delete, collect(a))],
        // Prefix and suffix are already trimmed, so single chars differ.
        (1, 1) => replace_all(a, b),
        _ => bisect(a, b),
    }
}

/// Find the middle snake of the shortest edit script and recurse on both
/// halves, keeping only two frontier vectors alive at a time.
///
/// Past [`MAX_EDIT_DISTANCE`] steps from either end the section is
/// reported as one delete plus one insert.
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn bisect(a: &[char], b: &[char]) -> Vec<DiffSpan> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    let max_d = ((n + m + 1) / 2).min(MAX_EDIT_DISTANCE as isize);
    let offset = max_d;
    let v_len = 2 * max_d + 2;
    let mut forward = vec![-1_isize; v_len as usize];
    let mut reverse = vec![-1_isize; v_len as usize];
    forward[(offset + 1) as usize] = 0;
    reverse[(offset + 1) as usize] = 0;

    let delta = n - m;
    // With an odd delta the forward path meets the reverse one; otherwise
    // the reverse path detects the overlap.
    let forward_checks = delta % 2 != 0;
    let in_range = |i: isize| (0..v_len).contains(&i);
    // A split must fall inside the grid and shrink the problem.
    let splits = |x: isize, y: isize| {
        (0..=n).contains(&x) && (0..=m).contains(&y) && (x, y) != (0, 0) && (x, y) != (n, m)
    };

    // Diagonals that ran off the grid are skipped on later steps.
    let (mut f_start, mut f_end, mut r_start, mut r_end) = (0, 0, 0, 0);

    for d in 0..max_d {
        let mut k = -d + f_start;
        while k <= d - f_end {
            let at = (offset + k) as usize;
            let mut x = if k == -d || (k != d && forward[at - 1] < forward[at + 1]) {
                forward[at + 1]
            } else {
                forward[at - 1] + 1
            };
            let mut y = x - k;
            while x < n && y < m && a[x as usize] == b[y as usize] {
                x += 1;
                y += 1;
            }
            forward[at] = x;
            if x > n {
                f_end += 2;
            } else if y > m {
                f_start += 2;
            } else if forward_checks {
                let r = offset + delta - k;
                if in_range(r)
                    && reverse[r as usize] != -1
                    && x >= n - reverse[r as usize]
                    && splits(x, y)
                {
                    return split(a, b, x as usize, y as usize);
                }
            }
            k += 2;
        }

        let mut k = -d + r_start;
        while k <= d - r_end {
            let at = (offset + k) as usize;
            let mut x = if k == -d || (k != d && reverse[at - 1] < reverse[at + 1]) {
                reverse[at + 1]
            } else {
                reverse[at - 1] + 1
            };
            let mut y = x - k;
            while x < n && y < m && a[(n - x - 1) as usize] == b[(m - y - 1) as usize] {
                x += 1;
                y += 1;
            }
            reverse[at] = x;
            if x > n {
                r_end += 2;
            } else if y > m {
                r_start += 2;
            } else if !forward_checks {
                let f = offset + delta - k;
                if in_range(f) && forward[f as usize] != -1 {
                    let fx = forward[f as usize];
                    let fy = offset + fx - f;
                    if fx >= n - x && splits(fx, fy) {
                        return split(a, b, fx as usize, fy as usize);
                    }
                }
            }
            k += 2;
        }
    }

    replace_all(a, b)
}

fn split(a: &[char], b: &[char], x: usize, y: usize) -> Vec<DiffSpan> {
    let mut spans = diff_chars(&a[..x], &b[..y]);
    spans.extend(diff_chars(&a[x..], &b[y..]));
    spans
}

/// Coalesce adjacent equalities and reorder each edit run as delete, insert.
fn merge(spans: Vec<DiffSpan>) -> Vec<DiffSpan> {
    let mut out: Vec<DiffSpan> = Vec::with_capacity(spans.len());
    let mut deleted = String::new();
    let mut inserted = String::new();

    let flush = |out: &mut Vec<DiffSpan>, deleted: &mut String, inserted: &mut String| {
        if !deleted.is_empty() {
            out.push(DiffSpan::new(DiffOp::Delete, std::mem::take(deleted)));
        }
        if !inserted.is_empty() {
            out.push(DiffSpan::new(DiffOp::Insert, std::mem::take(inserted)));
        }
    };

    for span in spans {
        if span.text.is_empty() {
            continue;
        }
        match span.op {
            DiffOp::Delete => deleted.push_str(&span.text),
            DiffOp::Insert => inserted.push_str(&span.text),
            DiffOp::Equal => {
                flush(&mut out, &mut deleted, &mut inserted);
                match out.last_mut() {
                    Some(last) if last.op == DiffOp::Equal => last.text.push_str(&span.text),
                    _ => out.push(span),
                }
            }
        }
    }
    flush(&mut out, &mut deleted, &mut inserted);
    out
}

/// Char counts `(deleted, inserted)` of the leading run of edits in `spans`.
fn edit_run<'a>(spans: impl Iterator<Item = &'a DiffSpan>) -> (usize, usize) {
    let mut deleted = 0;
    let mut inserted = 0;
    for span in spans {
        match span.op {
            DiffOp::Equal => break,
            DiffOp::Delete => deleted += span.char_len(),
            DiffOp::Insert => inserted += span.char_len(),
        }
    }
    (deleted, inserted)
}

/// Fold equalities no longer than the edits on both sides into those edits.
fn cleanup_semantic(mut spans: Vec<DiffSpan>) -> Vec<DiffSpan> {
    loop {
        let candidate = (1..spans.len().saturating_sub(1)).find(|&i| {
            if spans[i].op != DiffOp::Equal {
                return false;
            }
            let (del_before, ins_before) = edit_run(spans[..i].iter().rev());
            let (del_after, ins_after) = edit_run(spans[i + 1..].iter());
            let len = spans[i].char_len();
            len <= del_before.max(ins_before) && len <= del_after.max(ins_after)
        });

        let Some(i) = candidate else {
            return spans;
        };
        let text = std::mem::take(&mut spans[i].text);
        spans.splice(
            i..=i,
            [
                DiffSpan::new(DiffOp::Delete, text.clone()),
                DiffSpan::new(DiffOp::Insert, text),
            ],
        );
        spans = merge(spans);
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Render a rule-source diff as HTML markup.
#[must_use]
pub fn render_html(old: &str, new: &str) -> String {
    match (old.is_empty(), new.is_empty()) {
        (true, true) => NO_SOURCE_MARKER.to_string(),
        (true, false) => format!("<pre style='{INSERT_STYLE}'>{}</pre>", escape_html(new)),
        (false, true) => format!("<pre style='{DELETE_STYLE}'>{}</pre>", escape_html(old)),
        (false, false) => {
            let mut html = String::from("<pre>");
            for span in diff(old, new) {
                let text = escape_html(&span.text);
                let _ = match span.op {
                    DiffOp::Equal => write!(html, "<span>{text}</span>"),
                    DiffOp::Delete => write!(html, "<span style='{DELETE_STYLE}'>{text}</span>"),
                    DiffOp::Insert => write!(html, "<span style='{INSERT_STYLE}'>{text}</span>"),
                };
            }
            html.push_str("</pre>");
            html
        }
    }
}

/// Render a diff for a terminal, marking edits as `[-old-]` and `{+new+}`.
#[must_use]
pub fn render_text(spans: &[DiffSpan]) -> String {
    let mut out = String::new();
    for span in spans {
        match span.op {
            DiffOp::Equal => out.push_str(&span.text),
            DiffOp::Delete => {
                let _ = write!(out, "[-{}-]", span.text);
            }
            DiffOp::Insert => {
                let _ = write!(out, "{{+{}+}}", span.text);
            }
        }
    }
    out
}

/// Reassemble one side of a diff.
#[must_use]
pub fn side(spans: &[DiffSpan], keep: DiffOp) -> String {
    spans
        .iter()
        .filter(|s| s.op == DiffOp::Equal || s.op == keep)
        .map(|s| s.text.as_str())
        .collect()
}
