use derive_new::new;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::sym::Sym;
use crate::trie::{Trie, TrieNodeId};

/// Number of entries whose paths pass through a trie node (or, after
/// propagation, end in a suffix-automaton state's link subtree), together
/// with the half-open interval `[tot_cnt_lower, tot_cnt_upper)` those entries
/// occupy in the sorted vocabulary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, new)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CountInfo {
    pub str_cnt: u32,
    pub tot_cnt_lower: u32,
    pub tot_cnt_upper: u32,
}

/// Trie over a set of inputs plus the lexicographic bookkeeping computed by
/// [`sort`].
#[derive(Debug, Clone)]
pub struct SortResult<T: Sym> {
    pub trie: Trie<T>,
    /// Terminal trie node of each input.
    pub node_ids: Vec<TrieNodeId>,
    /// Indexed by trie node.
    pub cnt_info_on_nodes: Vec<CountInfo>,
    /// `cnt_info_on_nodes` looked up at each input's terminal.
    pub cnt_info_on_strings: Vec<CountInfo>,
    /// `order[k]` is the input index of the k-th entry in sorted order.
    pub order: Vec<u32>,
    /// Inverse permutation of `order`.
    pub rank: Vec<u32>,
}

/// Builds a trie over `seqs` and returns it along with the terminal node of
/// each input. Duplicate inputs share a terminal.
pub fn trie_from<T, S, I>(seqs: I) -> (Trie<T>, Vec<TrieNodeId>)
where
    T: Sym,
    S: AsRef<[T]>,
    I: IntoIterator<Item = S>,
{
    let mut trie = Trie::new();
    let node_ids = seqs
        .into_iter()
        .map(|seq| trie.insert(seq.as_ref().iter().copied()))
        .collect();
    (trie, node_ids)
}

/// Sorts `seqs` lexicographically by walking their trie in natural symbol
/// order, assigning every trie node the interval of sorted positions whose
/// entries pass through it.
pub fn sort<T, S, I>(seqs: I) -> SortResult<T>
where
    T: Sym,
    S: AsRef<[T]>,
    I: IntoIterator<Item = S>,
{
    let (trie, node_ids) = trie_from(seqs);

    let mut cnt_info_on_nodes = vec![CountInfo::default(); trie.num_nodes()];
    for &id in &node_ids {
        cnt_info_on_nodes[id as usize].str_cnt += 1;
    }

    // Pre-order position of a node = how many entries terminate strictly
    // before its subtree; the running counter is threaded through the DFS.
    trie.dfs(
        &mut (0u32, &mut cnt_info_on_nodes),
        |(tot, infos), id, _parent| {
            let info = &mut infos[id as usize];
            info.tot_cnt_lower = *tot;
            *tot += info.str_cnt;
        },
        |(tot, infos), id| {
            infos[id as usize].tot_cnt_upper = *tot;
        },
    );

    let cnt_info_on_strings: Vec<CountInfo> = node_ids
        .iter()
        .map(|&id| cnt_info_on_nodes[id as usize])
        .collect();

    let mut order: Vec<u32> = (0..node_ids.len() as u32).collect();
    order.sort_by_key(|&i| cnt_info_on_strings[i as usize].tot_cnt_lower);
    let mut rank = vec![0u32; order.len()];
    for (k, &i) in order.iter().enumerate() {
        rank[i as usize] = k as u32;
    }

    SortResult {
        trie,
        node_ids,
        cnt_info_on_nodes,
        cnt_info_on_strings,
        order,
        rank,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trie::TRIE_ROOT;

    fn char_seqs(vocab: &[&str]) -> Vec<Vec<char>> {
        vocab.iter().map(|s| s.chars().collect()).collect()
    }

    #[test]
    fn rank_matches_lexicographic_order() {
        let vocab = ["bb", "ca", "ab", "c", "aa", "bbaa", "a", "cc", "b"];
        let res = sort(&char_seqs(&vocab));

        let mut expected: Vec<&str> = vocab.to_vec();
        expected.sort_unstable();
        let by_order: Vec<&str> = res.order.iter().map(|&i| vocab[i as usize]).collect();
        assert_eq!(by_order, expected);

        for i in 0..vocab.len() {
            assert_eq!(res.order[res.rank[i] as usize] as usize, i);
        }
    }

    #[test]
    fn string_intervals_select_exactly_their_entry() {
        let vocab = ["bb", "ca", "ab", "c", "aa", "bbaa", "a", "cc", "b"];
        let res = sort(&char_seqs(&vocab));
        for (i, info) in res.cnt_info_on_strings.iter().enumerate() {
            assert_eq!(info.str_cnt, 1);
            assert_eq!(info.tot_cnt_lower, res.rank[i]);
            assert_eq!(info.tot_cnt_upper, res.rank[i] + 1);
        }
    }

    #[test]
    fn node_intervals_contain_descendant_terminals() {
        let vocab = ["bb", "ca", "ab", "c", "aa", "bbaa", "a", "cc", "b"];
        let res = sort(&char_seqs(&vocab));
        for (i, &terminal) in res.node_ids.iter().enumerate() {
            let leaf = res.cnt_info_on_strings[i];
            // every ancestor's interval covers the terminal's
            let mut node = terminal;
            loop {
                let info = res.cnt_info_on_nodes[node as usize];
                assert!(info.tot_cnt_lower <= leaf.tot_cnt_lower);
                assert!(leaf.tot_cnt_lower < info.tot_cnt_upper);
                if node == TRIE_ROOT {
                    break;
                }
                node = res.trie.node(node).parent();
            }
        }
    }

    #[test]
    fn root_interval_spans_everything() {
        let vocab = ["b", "a", "c"];
        let res = sort(&char_seqs(&vocab));
        assert_eq!(
            res.cnt_info_on_nodes[TRIE_ROOT as usize],
            CountInfo::new(0, 0, 3)
        );
    }

    #[test]
    fn duplicates_share_a_terminal_and_count_twice() {
        let res = sort(&char_seqs(&["a", "b", "a"]));
        assert_eq!(res.node_ids[0], res.node_ids[2]);
        let info = res.cnt_info_on_strings[0];
        assert_eq!(info.str_cnt, 2);
        assert_eq!((info.tot_cnt_lower, info.tot_cnt_upper), (0, 2));
        // order is a permutation with both duplicate slots present
        let mut order = res.order.clone();
        order.sort_unstable();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn byte_alphabet_sorts_by_byte_value() {
        let vocab: Vec<Vec<u8>> = ["b", "ab", "a"].iter().map(|s| s.bytes().collect()).collect();
        let res = sort(&vocab);
        let by_order: Vec<usize> = res.order.iter().map(|&i| i as usize).collect();
        assert_eq!(by_order, vec![2, 1, 0]);
    }
}
