use std::cmp::{max, min};

use debug_print::debug_println;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::sam::{GeneralSam, SamState, SamStateId, SAM_ROOT};
use crate::sort::{sort, trie_from, CountInfo, SortResult};
use crate::sym::{Sym, Token};
use crate::Error;

/// Granularity the vocabulary is indexed at: raw UTF-8 bytes or whole
/// Unicode scalar values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Alphabet {
    Bytes,
    Chars,
}

/// Prefix index over a vocabulary, answering queries that grow by
/// *prepending* tokens.
///
/// Internally this holds the forward vocabulary's trie sort (which numbers
/// each entry with its position range in sorted order) and a generalized
/// suffix automaton over the *reversed* entries. Prepending a token to the
/// query is then just feeding the reversed token forward into the automaton;
/// the interval attached to the reached state names exactly the sorted
/// entries the query is a prefix of.
#[derive(Debug)]
pub struct VocabPrefixAutomaton {
    alphabet: Alphabet,
    inner: Inner,
}

#[derive(Debug)]
enum Inner {
    Bytes(VocabIndex<u8>),
    Chars(VocabIndex<char>),
}

/// The alphabet-monomorphic core of [`VocabPrefixAutomaton`].
#[derive(Debug)]
struct VocabIndex<T: Sym> {
    sort_res: SortResult<T>,
    sam_rev: GeneralSam<T>,
    /// Indexed by automaton state; `None` when no entry has the state's
    /// recognized string (reversed) as a prefix.
    cnt_info_in_sam: Vec<Option<CountInfo>>,
}

impl<T: Sym> VocabIndex<T> {
    fn new(vocab: Vec<Vec<T>>) -> Self {
        let sort_res = sort(&vocab);

        let vocab_rev: Vec<Vec<T>> = vocab
            .iter()
            .map(|entry| entry.iter().rev().copied().collect())
            .collect();
        let (trie_rev, _) = trie_from(&vocab_rev);
        let sam_rev = GeneralSam::from_trie(&trie_rev);

        let cnt_info_in_sam =
            propagate_counts(&sam_rev, &vocab_rev, &sort_res.cnt_info_on_strings);

        Self {
            sort_res,
            sam_rev,
            cnt_info_in_sam,
        }
    }

    fn prepend_feed(&self, state: &mut SamState<'_, T>, token: &Token<'_>) -> Option<CountInfo> {
        match token.to_syms::<T>() {
            Ok(syms) => state.feed(syms.into_iter().rev()),
            // not expressible in this alphabet, hence not a substring of
            // any entry either
            Err(_) => state.park_nil(),
        }
        self.cnt_info_in_sam[state.node_id() as usize]
    }
}

/// Seeds each reversed entry's terminal state with the entry's forward-sort
/// interval, then folds the intervals up the suffix-link tree, deepest
/// states first. A state ends up covering every entry that has its
/// recognized string (read forward) as a prefix.
fn propagate_counts<T: Sym>(
    sam: &GeneralSam<T>,
    vocab_rev: &[Vec<T>],
    cnt_info_on_strings: &[CountInfo],
) -> Vec<Option<CountInfo>> {
    let mut cnt: Vec<Option<CountInfo>> = vec![None; sam.num_nodes()];

    for (entry, info) in vocab_rev.iter().zip(cnt_info_on_strings) {
        let mut state = sam.root_state();
        state.feed(entry.iter().copied());
        debug_assert!(!state.is_nil());
        // A duplicate entry lands on the same state and replaces the seed:
        // duplicates collapse to one representative here, while their
        // sorted-order slots stay visible through the interval bounds.
        cnt[state.node_id() as usize] = Some(CountInfo {
            str_cnt: 1,
            ..*info
        });
    }

    for &id in sam.topo_order().iter().rev() {
        if id == SAM_ROOT {
            continue;
        }
        let Some(info) = cnt[id as usize] else { continue };
        let link = sam.get_state(id).suffix_parent_id();
        match &mut cnt[link as usize] {
            Some(up) => {
                up.str_cnt += info.str_cnt;
                up.tot_cnt_lower = min(up.tot_cnt_lower, info.tot_cnt_lower);
                up.tot_cnt_upper = max(up.tot_cnt_upper, info.tot_cnt_upper);
            }
            slot => *slot = Some(info),
        }
    }

    // A propagated interval must always be covered by its suffix parent's.
    if cfg!(debug_assertions) {
        for &id in sam.topo_order() {
            if id == SAM_ROOT {
                continue;
            }
            let Some(info) = cnt[id as usize] else { continue };
            let up = cnt[sam.get_state(id).suffix_parent_id() as usize];
            debug_assert!(matches!(
                up,
                Some(up) if up.tot_cnt_lower <= info.tot_cnt_lower
                    && up.tot_cnt_upper >= info.tot_cnt_upper
            ));
        }
    }

    debug_println!(
        "propagated counts for {} entries across {} automaton states",
        vocab_rev.len(),
        sam.num_nodes()
    );
    cnt
}

fn coerce<T: Sym>(tokens: &[Token<'_>]) -> Result<Vec<Vec<T>>, Error> {
    tokens.iter().map(|token| token.to_syms()).collect()
}

impl VocabPrefixAutomaton {
    /// Builds the index over `vocab` at the chosen granularity.
    ///
    /// Entries are materialized and coerced to the alphabet once, so a
    /// single-pass iterator is fine; the reversed copy is derived from the
    /// coerced entries. Duplicate entries collapse to a single
    /// representative in the reported `str_cnt`, though every duplicate's
    /// sorted-order slot remains reachable through [`order_slice`].
    ///
    /// Fails with [`Error::EmptyVocabulary`] on an empty iterator and with
    /// [`Error::InvalidEncoding`] when a byte entry is not valid UTF-8 under
    /// [`Alphabet::Chars`].
    ///
    /// [`order_slice`]: VocabPrefixAutomaton::order_slice
    pub fn new<'a, I>(vocab: I, alphabet: Alphabet) -> Result<Self, Error>
    where
        I: IntoIterator,
        I::Item: Into<Token<'a>>,
    {
        let tokens: Vec<Token<'a>> = vocab.into_iter().map(Into::into).collect();
        if tokens.is_empty() {
            return Err(Error::EmptyVocabulary);
        }
        let inner = match alphabet {
            Alphabet::Bytes => Inner::Bytes(VocabIndex::new(coerce::<u8>(&tokens)?)),
            Alphabet::Chars => Inner::Chars(VocabIndex::new(coerce::<char>(&tokens)?)),
        };
        Ok(Self { alphabet, inner })
    }

    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    /// Handle positioned at the automaton root (the empty query).
    pub fn root_state(&self) -> PrefixState<'_> {
        let inner = match &self.inner {
            Inner::Bytes(index) => StateInner::Bytes(index.sam_rev.root_state()),
            Inner::Chars(index) => StateInner::Chars(index.sam_rev.root_state()),
        };
        PrefixState { inner }
    }

    /// Logically prepends `token` to the running query: feeds the token's
    /// symbols in reverse into `state` and reports the sorted-vocabulary
    /// interval of entries the grown query is a prefix of, if any.
    ///
    /// `None` with a live state means the query occurs inside some entry
    /// without starting one. Once the query is not a substring of any entry
    /// the state parks at nil; further feeds keep it there and return
    /// `None`. A token not expressible in the chosen alphabet (invalid
    /// UTF-8 under [`Alphabet::Chars`]) parks the state as well.
    pub fn prepend_feed<'t>(
        &self,
        state: &mut PrefixState<'_>,
        token: impl Into<Token<'t>>,
    ) -> Option<CountInfo> {
        let token = token.into();
        match (&self.inner, &mut state.inner) {
            (Inner::Bytes(index), StateInner::Bytes(state)) => index.prepend_feed(state, &token),
            (Inner::Chars(index), StateInner::Chars(state)) => index.prepend_feed(state, &token),
            _ => {
                debug_assert!(false, "state was built for a different alphabet");
                None
            }
        }
    }

    /// `order()[k]` is the vocabulary index of the k-th entry in sorted
    /// order.
    pub fn order(&self) -> &[u32] {
        match &self.inner {
            Inner::Bytes(index) => &index.sort_res.order,
            Inner::Chars(index) => &index.sort_res.order,
        }
    }

    /// Vocabulary indices of the entries selected by `cnt_info`, sorted
    /// lexicographically by entry.
    pub fn order_slice(&self, cnt_info: &CountInfo) -> &[u32] {
        &self.order()[cnt_info.tot_cnt_lower as usize..cnt_info.tot_cnt_upper as usize]
    }
}

/// Cursor tracking the query position, obtained from
/// [`VocabPrefixAutomaton::root_state`]. Cheap to copy; forking a search is
/// just copying the handle.
#[derive(Debug, Clone, Copy)]
pub struct PrefixState<'a> {
    inner: StateInner<'a>,
}

#[derive(Debug, Clone, Copy)]
enum StateInner<'a> {
    Bytes(SamState<'a, u8>),
    Chars(SamState<'a, char>),
}

impl PrefixState<'_> {
    /// Whether the query has stopped being a substring of every entry.
    pub fn is_nil(&self) -> bool {
        match &self.inner {
            StateInner::Bytes(state) => state.is_nil(),
            StateInner::Chars(state) => state.is_nil(),
        }
    }

    pub fn is_root(&self) -> bool {
        match &self.inner {
            StateInner::Bytes(state) => state.is_root(),
            StateInner::Chars(state) => state.is_root(),
        }
    }

    /// Whether the reversed query is a suffix of some reversed entry, i.e.
    /// the query starts an entry.
    pub fn is_accepting(&self) -> bool {
        match &self.inner {
            StateInner::Bytes(state) => state.is_accepting(),
            StateInner::Chars(state) => state.is_accepting(),
        }
    }

    /// Id of the underlying automaton state.
    pub fn node_id(&self) -> SamStateId {
        match &self.inner {
            StateInner::Bytes(state) => state.node_id(),
            StateInner::Chars(state) => state.node_id(),
        }
    }

    /// Id of the current state's suffix parent.
    pub fn suffix_parent_id(&self) -> SamStateId {
        match &self.inner {
            StateInner::Bytes(state) => state.suffix_parent_id(),
            StateInner::Chars(state) => state.suffix_parent_id(),
        }
    }

    /// Length of the longest substring recognized at the current state.
    pub fn len(&self) -> u32 {
        match &self.inner {
            StateInner::Bytes(state) => state.len(),
            StateInner::Chars(state) => state.len(),
        }
    }

    /// Feeds `text` into the automaton as-is, coerced to its alphabet —
    /// unlike [`VocabPrefixAutomaton::prepend_feed`], no reversal is
    /// applied, so this walks the *reversed* query forward.
    pub fn feed_text(&mut self, text: &str) {
        match &mut self.inner {
            StateInner::Bytes(state) => state.feed_text(text),
            StateInner::Chars(state) => state.feed_text(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_vocabulary_is_rejected() {
        let entries: [&str; 0] = [];
        assert!(matches!(
            VocabPrefixAutomaton::new(entries, Alphabet::Chars),
            Err(Error::EmptyVocabulary)
        ));
    }

    #[test]
    fn invalid_utf8_entry_is_rejected_for_chars() {
        let entries: [&[u8]; 2] = [b"ok", b"\xe4\xa8"];
        assert!(matches!(
            VocabPrefixAutomaton::new(entries, Alphabet::Chars),
            Err(Error::InvalidEncoding(_))
        ));
        // the same entries are fine at byte granularity
        assert!(VocabPrefixAutomaton::new(entries, Alphabet::Bytes).is_ok());
    }

    #[test]
    fn duplicate_entries_collapse_to_one_representative() {
        let automaton = VocabPrefixAutomaton::new(["a", "a"], Alphabet::Chars).unwrap();
        let mut state = automaton.root_state();
        let info = automaton.prepend_feed(&mut state, "a").unwrap();
        assert_eq!(info.str_cnt, 1);
        // both sorted slots remain visible through the interval
        assert_eq!((info.tot_cnt_lower, info.tot_cnt_upper), (0, 2));
        assert_eq!(automaton.order_slice(&info).len(), 2);
    }

    #[test]
    fn undecodable_token_parks_a_chars_state() {
        let automaton = VocabPrefixAutomaton::new(["abc"], Alphabet::Chars).unwrap();
        let mut state = automaton.root_state();
        assert_eq!(automaton.prepend_feed(&mut state, b"\xe4\xa8"), None);
        assert!(state.is_nil());
    }

    #[test]
    fn facade_states_expose_the_automaton_cursor() {
        let automaton = VocabPrefixAutomaton::new(["ab", "b"], Alphabet::Chars).unwrap();

        let root = automaton.root_state();
        assert_eq!(root.len(), 0);
        assert_eq!(root.node_id(), SAM_ROOT);

        // feeding the reversed query by hand lands on the same state as
        // prepending the forward token
        let mut state = automaton.root_state();
        state.feed_text("ba");
        let mut other = automaton.root_state();
        automaton.prepend_feed(&mut other, "ab");
        assert_eq!(state.node_id(), other.node_id());

        assert_eq!(state.len(), 2);
        assert!(state.is_accepting());
        assert!(!state.is_nil());
        assert_ne!(state.suffix_parent_id(), state.node_id());
    }

    #[test]
    fn forked_states_advance_independently() {
        let automaton =
            VocabPrefixAutomaton::new(["aa", "ab", "b"], Alphabet::Chars).unwrap();
        let mut state = automaton.root_state();
        automaton.prepend_feed(&mut state, "a");
        let mut forked = state;
        assert!(automaton.prepend_feed(&mut forked, "x").is_none());
        assert!(forked.is_nil());
        // the original handle is untouched
        assert!(!state.is_nil());
        assert!(automaton.prepend_feed(&mut state, "").is_some());
    }
}
