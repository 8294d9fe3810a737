/// Classification of a single reference word against what has been typed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum WordStatus {
    Correct,
    Error,
    Pending,
    Current,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WordState {
    pub word: String,
    pub status: WordStatus,
}

impl WordState {
    fn new(word: &str, status: WordStatus) -> Self {
        Self {
            word: word.to_string(),
            status,
        }
    }
}

/// Trim and split on runs of whitespace
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Whether the words after a candidate resync line up as well.
///
/// Both running out counts as agreement, and so does a last typed word
/// that is still a prefix of its reference word.
fn follows<R, I>(reference: &[R], input: &[I], i: usize, j: usize) -> bool
where
    R: AsRef<str>,
    I: AsRef<str>,
{
    match (reference.get(i).map(AsRef::as_ref), input.get(j).map(AsRef::as_ref)) {
        (None, None) => true,
        (Some(target), Some(typed)) if j + 1 == input.len() => target.starts_with(typed),
        (Some(target), Some(typed)) => target == typed,
        _ => false,
    }
}

/// Classify every reference word against the typed words.
///
/// Walks both sequences with two cursors. A typed word that differs from
/// its reference word is checked for a resync, which needs the following
/// pair of words to agree too: a typed word matching the next reference
/// word means the reference word was omitted; a next typed word matching
/// the reference word means the typed word was an insertion and is
/// skipped. Anything else is an error, or `Current` when it is the last
/// typed word (still being typed). Input past the end of the reference is
/// not reflected.
pub fn word_states<R, I>(reference: &[R], input: &[I]) -> Vec<WordState>
where
    R: AsRef<str>,
    I: AsRef<str>,
{
    let mut states = Vec::with_capacity(reference.len());
    let last_input = input.len().checked_sub(1);

    let (mut i, mut j) = (0, 0);
    while i < reference.len() {
        let target = reference[i].as_ref();

        let Some(typed) = input.get(j).map(AsRef::as_ref) else {
            states.push(WordState::new(target, WordStatus::Pending));
            i += 1;
            continue;
        };

        let omitted = reference.get(i + 1).map(AsRef::as_ref) == Some(typed)
            && follows(reference, input, i + 2, j + 1);
        let inserted = input.get(j + 1).map(AsRef::as_ref) == Some(target)
            && follows(reference, input, i + 1, j + 2);

        if typed == target {
            states.push(WordState::new(target, WordStatus::Correct));
            i += 1;
            j += 1;
        } else if omitted {
            states.push(WordState::new(target, WordStatus::Error));
            i += 1;
        } else if inserted {
            j += 1;
        } else {
            let status = if Some(j) == last_input {
                WordStatus::Current
            } else {
                WordStatus::Error
            };
            states.push(WordState::new(target, status));
            i += 1;
            j += 1;
        }
    }

    states
}

/// Convenience wrapper over raw text
pub fn compare_text(reference: &str, input: &str) -> Vec<WordState> {
    word_states(&tokenize(reference), &tokenize(input))
}

/// Position of the word being typed, if any
pub fn current_index(states: &[WordState]) -> Option<usize> {
    states.iter().position(|s| s.status == WordStatus::Current)
}

/// Word the reader's eye should be on: the one being typed, or the next
/// one still pending when the input ends on a word boundary
pub fn focus_index(states: &[WordState]) -> Option<usize> {
    current_index(states).or_else(|| {
        states
            .iter()
            .position(|s| s.status == WordStatus::Pending)
    })
}

pub fn count(states: &[WordState], status: WordStatus) -> usize {
    states.iter().filter(|s| s.status == status).count()
}
