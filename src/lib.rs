//! Vocabulary prefix search over generalized suffix automata.
//!
//! [`VocabPrefixAutomaton`] indexes a vocabulary so that a caller streaming
//! tokens in *reverse* — prepending each one to a running query — learns
//! after every token which sorted vocabulary entries the query is a prefix
//! of, as one contiguous range. That lookup is the core of token healing:
//! re-aligning a partial token stream to the vocabulary by enumerating every
//! token that could extend a trailing suffix of the text produced so far.
//!
//! ```
//! use vocprefix::{Alphabet, VocabPrefixAutomaton};
//!
//! let vocab = ["歌曲", "聆听歌曲", "播放歌曲", "歌词", "查看歌词"];
//! let automaton = VocabPrefixAutomaton::new(vocab, Alphabet::Chars).unwrap();
//! // sorted: 播放歌曲, 查看歌词, 歌曲, 歌词, 聆听歌曲
//!
//! let mut state = automaton.root_state();
//!
//! // query: "歌" — the prefix of 歌曲 and 歌词
//! let info = automaton.prepend_feed(&mut state, "歌").unwrap();
//! assert_eq!((info.tot_cnt_lower, info.tot_cnt_upper), (2, 4));
//! let entries: Vec<&str> = automaton
//!     .order_slice(&info)
//!     .iter()
//!     .map(|&i| vocab[i as usize])
//!     .collect();
//! assert_eq!(entries, ["歌曲", "歌词"]);
//!
//! // query: "听歌" — inside 聆听歌曲 but starting no entry
//! assert!(automaton.prepend_feed(&mut state, "听").is_none());
//! assert!(!state.is_nil());
//!
//! // query: "聆听歌" — the prefix of 聆听歌曲
//! let info = automaton.prepend_feed(&mut state, "聆").unwrap();
//! assert_eq!(automaton.order_slice(&info), [1]);
//! ```
//!
//! The pieces compose bottom-up and are usable on their own: [`Trie`] and
//! [`sort`] produce the lexicographic numbering, [`GeneralSam`] is the
//! suffix automaton over anything a trie holds, and the facade wires them
//! together over the reversed vocabulary.

mod sam;
mod sort;
mod sym;
mod trie;
mod vocab;

pub use sam::{GeneralSam, SamState, SamStateId, SAM_NIL, SAM_ROOT};
pub use sort::{sort, trie_from, CountInfo, SortResult};
pub use sym::{Sym, Token};
pub use trie::{Trie, TrieNode, TrieNodeId, TRIE_ROOT};
pub use vocab::{Alphabet, PrefixState, VocabPrefixAutomaton};

/// Errors surfaced by [`VocabPrefixAutomaton::new`]; query-time operations
/// never fail.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A byte sequence had to be decoded for the chars alphabet and was not
    /// valid UTF-8.
    #[error("entry is not valid UTF-8: {0}")]
    InvalidEncoding(#[from] std::str::Utf8Error),
    /// The vocabulary iterator yielded no entries.
    #[error("cannot index an empty vocabulary")]
    EmptyVocabulary,
}
