use std::collections::BTreeMap;

use debug_print::debug_println;

use crate::sym::Sym;
use crate::trie::{Trie, TRIE_ROOT};

/// Index into the automaton's state arena.
pub type SamStateId = u32;

/// The root state, recognizing the empty string.
pub const SAM_ROOT: SamStateId = 0;

/// Reserved sentinel meaning "no such state". It has no outgoing
/// transitions, so a feed that dies parks here and stays.
pub const SAM_NIL: SamStateId = 1;

#[derive(Debug, Clone)]
struct SamNode<T> {
    trans: BTreeMap<T, SamStateId>,
    /// Suffix link; `SAM_NIL` above the root.
    link: SamStateId,
    /// Length of the longest substring recognized at this state.
    len: u32,
    accept: bool,
}

impl<T: Sym> SamNode<T> {
    fn new(len: u32, link: SamStateId) -> Self {
        Self {
            trans: BTreeMap::new(),
            link,
            len,
            accept: false,
        }
    }
}

/// Generalized suffix automaton: the minimal deterministic automaton
/// recognizing every substring of every sequence in a trie.
///
/// States live in a dense arena and refer to each other by id, so handles
/// ([`SamState`]) are a plain `(&automaton, id)` pair. Once built the
/// automaton is immutable.
#[derive(Debug, Clone)]
pub struct GeneralSam<T: Sym> {
    nodes: Vec<SamNode<T>>,
    topo: Vec<SamStateId>,
}

impl<T: Sym> GeneralSam<T> {
    /// Builds the suffix automaton of a single sequence.
    pub fn from_seq(seq: &[T]) -> Self {
        let mut trie = Trie::new();
        trie.insert(seq.iter().copied());
        Self::from_trie(&trie)
    }

    /// Builds the generalized suffix automaton of every sequence in `trie`.
    ///
    /// Trie nodes are consumed in breadth-first order, each extending the
    /// state reached by its parent's path by one symbol. States reached by
    /// accepting trie nodes are marked accepting, and the mark is then
    /// propagated up suffix links so that acceptance means "the recognized
    /// string is a suffix of some inserted sequence".
    pub fn from_trie(trie: &Trie<T>) -> Self {
        let mut sam = Self {
            nodes: vec![SamNode::new(0, SAM_NIL), SamNode::new(0, SAM_NIL)],
            topo: Vec::new(),
        };
        sam.nodes[SAM_ROOT as usize].accept = trie.node(TRIE_ROOT).is_accepting();

        // last[n] = state reached by reading the path from the trie root to
        // n; breadth-first order guarantees it is set before n is extended
        let mut last = vec![SAM_ROOT; trie.num_nodes()];
        for n in trie.bfs_order() {
            for (sym, m) in trie.children(n) {
                let state = sam.extend(last[n as usize], sym);
                last[m as usize] = state;
                if trie.node(m).is_accepting() {
                    sam.nodes[state as usize].accept = true;
                }
            }
        }

        sam.topo = sam.order_by_len();
        sam.spread_accept();

        debug_println!(
            "suffix automaton: {} states over {} trie nodes",
            sam.nodes.len(),
            trie.num_nodes()
        );
        sam
    }

    /// Extends the automaton by `sym` from state `p`, returning the state
    /// recognizing the extended path.
    fn extend(&mut self, p: SamStateId, sym: T) -> SamStateId {
        if let Some(v) = self.nodes[p as usize].trans.get(&sym).copied() {
            // The extended path is already recognized, because another trie
            // branch spelled the same sequence of symbols from the root.
            if self.nodes[v as usize].len == self.nodes[p as usize].len + 1 {
                return v;
            }
            // v recognizes a longer class as well; split off the part whose
            // longest string is exactly the extended path.
            return self.split(p, sym, v);
        }

        let q = self.alloc(SamNode::new(self.nodes[p as usize].len + 1, SAM_NIL));
        // Install the new transition on every suffix ancestor lacking one.
        let mut u = p;
        while u != SAM_NIL && !self.nodes[u as usize].trans.contains_key(&sym) {
            self.nodes[u as usize].trans.insert(sym, q);
            u = self.nodes[u as usize].link;
        }
        if u == SAM_NIL {
            self.nodes[q as usize].link = SAM_ROOT;
            return q;
        }

        let v = self.nodes[u as usize].trans[&sym];
        let link = if self.nodes[v as usize].len == self.nodes[u as usize].len + 1 {
            v
        } else {
            self.split(u, sym, v)
        };
        self.nodes[q as usize].link = link;
        q
    }

    /// Clones `v` into a twin whose length is exactly `len(u) + 1`, making
    /// the twin the suffix parent of `v` and retargeting the `sym`
    /// transitions of `u` and its suffix ancestors that pointed at `v`.
    fn split(&mut self, u: SamStateId, sym: T, v: SamStateId) -> SamStateId {
        let mut twin = self.nodes[v as usize].clone();
        twin.len = self.nodes[u as usize].len + 1;
        // the original keeps its accept mark
        twin.accept = false;
        let clone = self.alloc(twin);
        self.nodes[v as usize].link = clone;

        let mut w = u;
        while w != SAM_NIL && self.nodes[w as usize].trans.get(&sym) == Some(&v) {
            self.nodes[w as usize].trans.insert(sym, clone);
            w = self.nodes[w as usize].link;
        }
        clone
    }

    fn alloc(&mut self, node: SamNode<T>) -> SamStateId {
        let id = self.nodes.len() as SamStateId;
        self.nodes.push(node);
        id
    }

    /// Forward topological order over the non-nil states: every transition
    /// strictly increases `len` and every suffix link strictly decreases it,
    /// so ordering by `len` serves both graphs.
    fn order_by_len(&self) -> Vec<SamStateId> {
        let mut order: Vec<SamStateId> = (0..self.nodes.len() as SamStateId)
            .filter(|&id| id != SAM_NIL)
            .collect();
        order.sort_by_key(|&id| self.nodes[id as usize].len);
        order
    }

    /// Every suffix of an accepted string is itself accepted, and the suffix
    /// link chain of a state enumerates exactly the classes of its shorter
    /// suffixes. Deepest states first, so marks cascade to the root.
    fn spread_accept(&mut self) {
        for i in (0..self.topo.len()).rev() {
            let id = self.topo[i];
            if id != SAM_ROOT && self.nodes[id as usize].accept {
                let link = self.nodes[id as usize].link;
                self.nodes[link as usize].accept = true;
            }
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Handle positioned at the root.
    pub fn root_state(&self) -> SamState<'_, T> {
        self.get_state(SAM_ROOT)
    }

    /// Handle positioned at `id`; ids outside the arena resolve to nil.
    pub fn get_state(&self, id: SamStateId) -> SamState<'_, T> {
        let node_id = if (id as usize) < self.nodes.len() {
            id
        } else {
            SAM_NIL
        };
        SamState { sam: self, node_id }
    }

    /// State ids in forward topological order (root first, nil excluded).
    pub fn topo_order(&self) -> &[SamStateId] {
        &self.topo
    }
}

/// Cursor over a [`GeneralSam`]: the automaton plus a current state id.
///
/// Copying is free; feeding advances the id in place and parks it at the nil
/// state once no transition matches.
#[derive(Debug, Clone, Copy)]
pub struct SamState<'a, T: Sym> {
    sam: &'a GeneralSam<T>,
    node_id: SamStateId,
}

impl<'a, T: Sym> SamState<'a, T> {
    pub fn node_id(&self) -> SamStateId {
        self.node_id
    }

    pub fn is_root(&self) -> bool {
        self.node_id == SAM_ROOT
    }

    pub fn is_nil(&self) -> bool {
        self.node_id == SAM_NIL
    }

    /// Whether the recognized string is a suffix of some inserted sequence.
    pub fn is_accepting(&self) -> bool {
        self.sam.nodes[self.node_id as usize].accept
    }

    /// Length of the longest substring recognized at the current state.
    pub fn len(&self) -> u32 {
        self.sam.nodes[self.node_id as usize].len
    }

    /// Id of the suffix parent; `SAM_NIL` above the root.
    pub fn suffix_parent_id(&self) -> SamStateId {
        self.sam.nodes[self.node_id as usize].link
    }

    /// Advances by one symbol; without a matching transition the state goes
    /// nil and stays there.
    pub fn goto(&mut self, sym: T) {
        self.node_id = self.sam.nodes[self.node_id as usize]
            .trans
            .get(&sym)
            .copied()
            .unwrap_or(SAM_NIL);
    }

    /// Follows `seq` symbol by symbol.
    pub fn feed<I>(&mut self, seq: I)
    where
        I: IntoIterator<Item = T>,
    {
        for sym in seq {
            self.goto(sym);
        }
    }

    /// Feeds `text` coerced to this automaton's alphabet.
    pub fn feed_text(&mut self, text: &str) {
        self.feed(T::from_text(text));
    }

    pub(crate) fn park_nil(&mut self) {
        self.node_id = SAM_NIL;
    }
}
