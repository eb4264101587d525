use std::collections::HashMap;
use log::trace;
use crate::board::{Board, Pile};

pub type Score = i64;

/// Value of a live position once the search horizon is exhausted.
pub const CUTOFF_SCORE: Score = 0;

/// Static value of a position: two points per red marble, three per blue.
pub fn evaluate(board: &Board) -> Score {
    2 * Score::from(board.red) + 3 * Score::from(board.blue)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NodeKey {
    red: u32,
    blue: u32,
    depth: u32,
    maximizing: bool,
}

/// How a cached score relates to the true value of its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Exact,
    // search failed high: true value >= score
    Lower,
    // search failed low: true value <= score
    Upper,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    score: Score,
    bound: Bound,
}

enum Node {
    Leaf(Score),
    Open(Frame),
}

/// A node whose children are being searched.
struct Frame {
    key: NodeKey,
    board: Board,
    alpha: Score,
    beta: Score,
    original_alpha: Score,
    original_beta: Score,
    best: Score,
    // index into `Pile::ALL` of the next child to try
    next: usize,
    cut: bool,
}

impl Frame {
    fn next_child(&mut self) -> Option<Board> {
        if self.cut {
            return None;
        }
        while let Some(&pile) = Pile::ALL.get(self.next) {
            self.next += 1;
            if self.board.is_legal(pile) {
                return Some(self.board.take(pile));
            }
        }
        None
    }

    /// Folds a child's score in. Returns true when the window has closed.
    fn absorb(&mut self, value: Score, pruning: bool) -> bool {
        if self.key.maximizing {
            self.best = self.best.max(value);
        } else {
            self.best = self.best.min(value);
        }
        if !pruning {
            return false;
        }
        if self.key.maximizing {
            self.alpha = self.alpha.max(self.best);
        } else {
            self.beta = self.beta.min(self.best);
        }
        self.cut = self.alpha >= self.beta;
        self.cut
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes expanded, cache answers excluded.
    pub nodes: u64,
    pub cache_hits: u64,
    pub cutoffs: u64,
}

/// Depth-limited minimax over a two-pile position with alpha-beta pruning.
///
/// Every engine owns its node cache. Cached scores are a pure function of
/// `(red, blue, depth, maximizing)`, so one engine can serve any number of
/// searches and games, but never shares entries with another engine.
pub struct Engine {
    cache: HashMap<NodeKey, Entry>,
    pruning: bool,
    stats: SearchStats,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
            pruning: true,
            stats: SearchStats::default(),
        }
    }

    /// Same search, but every child is visited with the full window.
    #[cfg(test)]
    pub fn without_pruning() -> Self {
        Self {
            pruning: false,
            ..Self::new()
        }
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Searches `board` with a fresh, unbounded window.
    pub fn search_root(&mut self, board: Board, depth: u32, maximizing: bool) -> Score {
        self.search(board, depth, maximizing, Score::MIN, Score::MAX)
    }

    /// Value of `board` with `depth` plies of look-ahead left. The maximizing
    /// side raises the score, the minimizing side lowers it. Returns the exact
    /// value when it lies inside `(alpha, beta)`, otherwise a bound on the
    /// failing side.
    ///
    /// Open nodes live on a heap-allocated stack, so the look-ahead is not
    /// limited by the thread's call stack.
    pub fn search(&mut self, board: Board, depth: u32, maximizing: bool, alpha: Score, beta: Score) -> Score {
        let mut stack = match self.enter(board, depth, maximizing, alpha, beta) {
            Node::Leaf(score) => return score,
            Node::Open(frame) => vec![frame],
        };
        // score of the node closed last, not yet folded into its parent
        let mut returned: Option<Score> = None;

        while let Some(frame) = stack.last_mut() {
            if let Some(value) = returned.take() {
                if frame.absorb(value, self.pruning) {
                    trace!("cutoff at {} depth {}", frame.board, frame.key.depth);
                    self.stats.cutoffs += 1;
                }
            }
            match frame.next_child() {
                Some(child) => {
                    let (depth, maximizing) = (frame.key.depth - 1, !frame.key.maximizing);
                    let (alpha, beta) = (frame.alpha, frame.beta);
                    match self.enter(child, depth, maximizing, alpha, beta) {
                        Node::Leaf(score) => returned = Some(score),
                        Node::Open(child_frame) => stack.push(child_frame),
                    }
                }
                None => {
                    if let Some(done) = stack.pop() {
                        let score = self.close(done);
                        if stack.is_empty() {
                            return score;
                        }
                        returned = Some(score);
                    }
                }
            }
        }
        unreachable!("search stack drained before the root closed")
    }

    /// Answers `board` from the cache or as a leaf, or opens it for expansion.
    fn enter(&mut self, board: Board, depth: u32, maximizing: bool, alpha: Score, beta: Score) -> Node {
        let key = NodeKey {
            red: board.red,
            blue: board.blue,
            depth,
            maximizing,
        };

        if let Some(entry) = self.cache.get(&key) {
            let usable = match entry.bound {
                Bound::Exact => true,
                Bound::Lower => entry.score >= beta,
                Bound::Upper => entry.score <= alpha,
            };
            if usable {
                self.stats.cache_hits += 1;
                return Node::Leaf(entry.score);
            }
        }
        self.stats.nodes += 1;

        if board.is_terminal() {
            return Node::Leaf(self.store(key, evaluate(&board), Bound::Exact));
        }
        if depth == 0 {
            return Node::Leaf(self.store(key, CUTOFF_SCORE, Bound::Exact));
        }

        Node::Open(Frame {
            key,
            board,
            alpha,
            beta,
            original_alpha: alpha,
            original_beta: beta,
            best: if maximizing { Score::MIN } else { Score::MAX },
            next: 0,
            cut: false,
        })
    }

    fn close(&mut self, frame: Frame) -> Score {
        let bound = if !self.pruning {
            Bound::Exact
        } else if frame.best <= frame.original_alpha {
            Bound::Upper
        } else if frame.best >= frame.original_beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.store(frame.key, frame.best, bound)
    }

    fn store(&mut self, key: NodeKey, score: Score, bound: Bound) -> Score {
        self.cache.insert(key, Entry { score, bound });
        score
    }
}
