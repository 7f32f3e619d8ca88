use crate::checker::dictionary::Dictionary;
use fst::Streamer;

/// Rank dictionary words by Damerau-Levenshtein distance to `word`.
///
/// `word` must already be lower-cased. Every word within `max_distance`
/// edits is returned, sorted by distance and then alphabetically. The
/// word itself (distance 0) is never suggested.
pub fn generate(dictionary: &Dictionary, word: &str, max_distance: usize) -> Vec<String> {
    let target: Vec<char> = word.chars().collect();
    if target.is_empty() {
        return Vec::new();
    }

    let mut candidate = Vec::new();
    let mut scratch = Scratch::default();
    let mut found = Vec::new();

    let mut stream = dictionary.set().stream();
    while let Some(key) = stream.next() {
        // Each char is at least one byte, so a key shorter than
        // len - max_distance bytes can never be close enough.
        if key.len() + max_distance < target.len() {
            continue;
        }
        let Ok(text) = std::str::from_utf8(key) else {
            continue;
        };

        candidate.clear();
        candidate.extend(text.chars());
        if candidate.len().abs_diff(target.len()) > max_distance {
            continue;
        }

        if let Some(distance) = bounded_distance(&target, &candidate, max_distance, &mut scratch) {
            if distance > 0 {
                found.push((distance, text.to_string()));
            }
        }
    }

    // Keys stream in lexical order, so a stable sort by distance keeps
    // ties alphabetical.
    found.sort_by_key(|(distance, _)| *distance);
    found.into_iter().map(|(_, word)| word).collect()
}

#[derive(Default)]
struct Scratch {
    two_back: Vec<usize>,
    prev: Vec<usize>,
    current: Vec<usize>,
}

/// Optimal string alignment distance between `a` and `b`, or `None` as
/// soon as it is certain to exceed `max`.
fn bounded_distance(a: &[char], b: &[char], max: usize, scratch: &mut Scratch) -> Option<usize> {
    if a.len().abs_diff(b.len()) > max {
        return None;
    }

    let width = b.len() + 1;
    let Scratch {
        two_back,
        prev,
        current,
    } = scratch;
    two_back.clear();
    two_back.resize(width, 0);
    prev.clear();
    prev.extend(0..width);
    current.clear();
    current.resize(width, 0);

    for i in 1..=a.len() {
        current[0] = i;
        let mut row_min = current[0];

        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            let mut value = (prev[j] + 1) // deletion
                .min(current[j - 1] + 1) // insertion
                .min(prev[j - 1] + cost); // substitution

            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                value = value.min(two_back[j - 2] + 1); // transposition
            }

            current[j] = value;
            row_min = row_min.min(value);
        }

        if row_min > max {
            return None;
        }

        std::mem::swap(two_back, prev);
        std::mem::swap(prev, current);
    }

    let distance = prev[b.len()];
    (distance <= max).then_some(distance)
}

/// Unbounded distance, for callers that want the raw number.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let max = a.len().max(b.len());
    bounded_distance(&a, &b, max, &mut Scratch::default()).unwrap_or(max)
}
