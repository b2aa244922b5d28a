//! Monte Carlo Tree Search with UCB1 selection.
//!
//! The tree lives in an arena: nodes are addressed by index, each node keeps
//! its parent's index and its children's indices, and the whole arena is
//! dropped once a decision has been made.
//!
//! One iteration is:
//! - Selection: descend by UCB1 until a node with untried moves or a
//!   terminal node is reached
//! - Expansion: materialize one random untried move as a new child
//! - Simulation: random playout from the new child
//! - Backpropagation: add one visit and the playout reward to every node on
//!   the path back to the root
//!
//! Rewards are always scored for the player to move at the root; they are
//! not flipped from one level to the next.

use log::trace;

use crate::board::Player;
use crate::config::SearchConfig;
use crate::playout::{playout, reward};
use crate::rules::Game;

/// Index of a node in a [`SearchTree`].
pub type NodeId = usize;

/// The root is always the first node pushed.
pub const ROOT: NodeId = 0;

/// A node in the search tree: one game state reached during search.
pub struct TreeNode<G: Game> {
    /// The game state at this node
    pub state: G::State,
    /// Move that produced this state; `None` at the root
    pub mv: Option<G::Move>,
    /// Player who made `mv`. At the root, the player who moved last, so
    /// that children belong to the player to move.
    pub player: Player,
    /// Number of playouts through this node
    pub visits: u32,
    /// Sum of playout rewards, in [0, visits]
    pub reward: f64,
    /// Non-owning back reference; `None` at the root
    pub parent: Option<NodeId>,
    /// Expanded children
    pub children: Vec<NodeId>,
    /// Moves from this state not yet materialized as children
    untried: Vec<G::Move>,
    /// Game over at this node
    terminal: bool,
}

impl<G: Game> TreeNode<G> {
    fn new(
        game: &G,
        state: G::State,
        mv: Option<G::Move>,
        player: Player,
        parent: Option<NodeId>,
    ) -> Self {
        let terminal = game.is_terminal(&state, mv.map(|m| (m, player)));
        let untried = if terminal {
            Vec::new()
        } else {
            game.valid_moves(&state)
        };
        Self {
            state,
            mv,
            player,
            visits: 0,
            reward: 0.0,
            parent,
            children: Vec::new(),
            untried,
            terminal,
        }
    }

    /// Average reward, or -0.1 for an unvisited node.
    #[inline]
    pub fn winrate(&self) -> f64 {
        if self.visits > 0 {
            self.reward / self.visits as f64
        } else {
            -0.1
        }
    }

    /// Move that produced this node.
    ///
    /// # Panics
    ///
    /// Panics on the root, which no move produced.
    pub fn move_in(&self) -> G::Move {
        match self.mv {
            Some(mv) => mv,
            None => panic!("the root node has no move"),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// True once every valid move has a child.
    pub fn is_fully_expanded(&self) -> bool {
        self.untried.is_empty()
    }
}

/// Arena-backed search tree for one decision.
pub struct SearchTree<'g, G: Game> {
    game: &'g G,
    nodes: Vec<TreeNode<G>>,
    /// Player to move at the root; rewards are scored for this player.
    root_player: Player,
}

impl<'g, G: Game> SearchTree<'g, G> {
    /// Create a tree whose root is `state` with `to_move` to play.
    pub fn new(game: &'g G, state: G::State, to_move: Player) -> Self {
        let root = TreeNode::new(game, state, None, game.opponent(to_move), None);
        Self {
            game,
            nodes: vec![root],
            root_player: to_move,
        }
    }

    pub fn root(&self) -> &TreeNode<G> {
        &self.nodes[ROOT]
    }

    pub fn node(&self, id: NodeId) -> &TreeNode<G> {
        &self.nodes[id]
    }

    pub fn root_player(&self) -> Player {
        self.root_player
    }

    /// Iterate over all node ids in creation order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        0..self.nodes.len()
    }

    /// UCB1 score of `child` under `parent`. Unvisited children score
    /// infinity so they are always tried first.
    fn ucb1(&self, parent: NodeId, child: NodeId, c: f64) -> f64 {
        let child = &self.nodes[child];
        if child.visits == 0 {
            return f64::INFINITY;
        }
        let parent_visits = self.nodes[parent].visits as f64;
        let n = child.visits as f64;
        child.reward / n + c * (parent_visits.ln() / n).sqrt()
    }

    /// Child of `id` with the highest UCB1 score; ties go to the earliest
    /// child.
    fn most_urgent(&self, id: NodeId, c: f64) -> NodeId {
        let mut best = None;
        let mut best_score = f64::NEG_INFINITY;
        for &child in &self.nodes[id].children {
            let score = self.ucb1(id, child, c);
            if best.is_none() || score > best_score {
                best = Some(child);
                best_score = score;
            }
        }
        // Non-terminal, fully expanded nodes always have children.
        best.unwrap_or(id)
    }

    /// Descend from the root to the node the next playout starts from,
    /// expanding one child on the way if possible.
    fn select(&mut self, c: f64, rng: &mut fastrand::Rng) -> NodeId {
        let mut id = ROOT;
        while !self.nodes[id].terminal {
            if !self.nodes[id].untried.is_empty() {
                return self.expand(id, rng);
            }
            let next = self.most_urgent(id, c);
            if next == id {
                break;
            }
            id = next;
        }
        id
    }

    /// Materialize a uniformly random untried move of `id` as a new child.
    fn expand(&mut self, id: NodeId, rng: &mut fastrand::Rng) -> NodeId {
        let node = &mut self.nodes[id];
        let k = rng.usize(..node.untried.len());
        let mv = node.untried.swap_remove(k);
        let player = self.game.opponent(node.player);
        let state = self.game.apply(&node.state, mv, player);

        let child_id = self.nodes.len();
        let child = TreeNode::new(self.game, state, Some(mv), player, Some(id));
        self.nodes.push(child);
        self.nodes[id].children.push(child_id);
        child_id
    }

    /// Random playout from `id`, scored for the root player.
    fn simulate(&self, id: NodeId, rng: &mut fastrand::Rng) -> f64 {
        let node = &self.nodes[id];
        let last = node.mv.map(|m| (m, node.player));
        let winner = playout(
            self.game,
            &node.state,
            last,
            self.game.opponent(node.player),
            rng,
        );
        reward(winner, self.root_player)
    }

    /// Add one visit and `reward` to `id` and all its ancestors.
    fn backpropagate(&mut self, id: NodeId, reward: f64) {
        let mut current = Some(id);
        while let Some(i) = current {
            let node = &mut self.nodes[i];
            node.visits += 1;
            node.reward += reward;
            current = node.parent;
        }
    }

    /// Run one select/expand/simulate/backpropagate iteration.
    pub fn iterate(&mut self, c: f64, rng: &mut fastrand::Rng) {
        let leaf = self.select(c, rng);
        let r = self.simulate(leaf, rng);
        self.backpropagate(leaf, r);
    }

    /// Most visited root child, considering only children whose move is in
    /// `allowed` when that leaves any. Ties go to the earliest child.
    /// `None` if the root has no children.
    pub fn best_child(&self, allowed: Option<&[G::Move]>) -> Option<NodeId> {
        let children = &self.root().children;
        let permitted = children.iter().copied().filter(|&id| {
            match (allowed, self.nodes[id].mv) {
                (Some(moves), Some(mv)) => moves.contains(&mv),
                _ => true,
            }
        });
        self.most_visited(permitted)
            .or_else(|| self.most_visited(children.iter().copied()))
    }

    fn most_visited(&self, ids: impl Iterator<Item = NodeId>) -> Option<NodeId> {
        let mut best: Option<NodeId> = None;
        for id in ids {
            if best.is_none_or(|b| self.nodes[id].visits > self.nodes[b].visits) {
                best = Some(id);
            }
        }
        best
    }

    /// Move of [`SearchTree::best_child`].
    pub fn best_move(&self, allowed: Option<&[G::Move]>) -> Option<G::Move> {
        self.best_child(allowed).map(|id| self.nodes[id].move_in())
    }
}

/// Run `config.simulations()` iterations from `state` with `to_move` to
/// play, and return the finished tree.
///
/// There is no early exit: the iteration count is the only stopping rule.
///
/// # Panics
///
/// Panics if `state` is terminal; callers must check for a finished board
/// first.
pub fn tree_search<'g, G: Game>(
    game: &'g G,
    state: G::State,
    to_move: Player,
    config: &SearchConfig,
    rng: &mut fastrand::Rng,
) -> SearchTree<'g, G> {
    let mut tree = SearchTree::new(game, state, to_move);
    assert!(!tree.root().terminal, "search started on a terminal state");
    for _ in 0..config.simulations() {
        tree.iterate(config.exploration(), rng);
    }
    tree
}

/// Log the root children's statistics at trace level.
pub fn dump_children<G: Game>(tree: &SearchTree<'_, G>) {
    for &id in &tree.root().children {
        let child = tree.node(id);
        trace!(
            "move {:?} visits={} reward={:.1} wr={:.3}",
            child.mv,
            child.visits,
            child.reward,
            child.winrate()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, Move};
    use crate::rules::{FourInARow, Status};

    /// Take one or two tokens; whoever takes the last token wins.
    struct Countdown;

    impl Game for Countdown {
        type State = u8;
        type Move = u8;

        fn valid_moves(&self, state: &u8) -> Vec<u8> {
            (1..=2).filter(|&n| n <= *state).collect()
        }

        fn apply(&self, state: &u8, mv: u8, _player: Player) -> u8 {
            state - mv
        }

        fn evaluate(&self, state: &u8, _last: u8, _player: Player) -> Status {
            if *state == 0 {
                Status::Win
            } else {
                Status::Ongoing
            }
        }
    }

    fn assert_visits_conserved<G: Game>(tree: &SearchTree<'_, G>) {
        for id in tree.ids() {
            let node = tree.node(id);
            assert!(node.reward >= 0.0 && node.reward <= node.visits as f64);
            for &child in &node.children {
                assert_eq!(tree.node(child).parent, Some(id));
            }
            if node.children.is_empty() {
                continue;
            }
            let child_visits: u32 = node.children.iter().map(|&c| tree.node(c).visits).sum();
            if id == ROOT {
                assert_eq!(child_visits, node.visits);
            } else {
                // The playout that created the node is not under any child.
                assert_eq!(child_visits + 1, node.visits);
            }
        }
    }

    #[test]
    fn test_visit_conservation() {
        let config = SearchConfig::new(400, 1.0).unwrap();
        let mut rng = fastrand::Rng::with_seed(3);
        let tree = tree_search(&FourInARow, Board::new(), Player::One, &config, &mut rng);
        assert_eq!(tree.root().visits, 400);
        assert!(tree.root().is_fully_expanded());
        assert_eq!(tree.root().children.len(), 16);
        assert_visits_conserved(&tree);
    }

    #[test]
    fn test_ucb1_score_and_ties() {
        let mut rng = fastrand::Rng::with_seed(0);
        let mut tree = SearchTree::new(&Countdown, 5u8, Player::One);
        let first = tree.expand(ROOT, &mut rng);
        let second = tree.expand(ROOT, &mut rng);
        assert_eq!(tree.root().children, vec![first, second]);

        // Both unvisited: infinite scores, earliest child first.
        assert_eq!(tree.ucb1(ROOT, first, 1.0), f64::INFINITY);
        assert_eq!(tree.ucb1(ROOT, second, 1.0), f64::INFINITY);
        assert_eq!(tree.most_urgent(ROOT, 1.0), first);

        tree.nodes[ROOT].visits = 10;
        tree.nodes[first].visits = 4;
        tree.nodes[first].reward = 3.0;
        tree.nodes[second].visits = 6;
        tree.nodes[second].reward = 1.5;
        let c = 1.3;
        let expected_first = 3.0 / 4.0 + c * (10f64.ln() / 4.0).sqrt();
        let expected_second = 1.5 / 6.0 + c * (10f64.ln() / 6.0).sqrt();
        assert!((tree.ucb1(ROOT, first, c) - expected_first).abs() < 1e-12);
        assert!((tree.ucb1(ROOT, second, c) - expected_second).abs() < 1e-12);
        assert_eq!(tree.most_urgent(ROOT, c), first);
        assert_eq!(tree.best_child(None), Some(second));

        // Equal statistics give equal scores and equal visits.
        tree.nodes[second].visits = 4;
        tree.nodes[second].reward = 3.0;
        assert_eq!(tree.ucb1(ROOT, first, c), tree.ucb1(ROOT, second, c));
        assert_eq!(tree.most_urgent(ROOT, c), first);
        assert_eq!(tree.best_child(None), Some(first));

        tree.nodes[second].reward = 3.5;
        assert_eq!(tree.most_urgent(ROOT, c), second);
    }

    #[test]
    fn test_reward_same_at_every_depth() {
        let mut rng = fastrand::Rng::with_seed(4);
        let mut tree = SearchTree::new(&Countdown, 6u8, Player::One);
        for _ in 0..3 {
            tree.iterate(1.0, &mut rng);
        }
        let mut saw_terminal = false;
        for _ in 0..60 {
            let before: Vec<(u32, f64)> =
                tree.nodes.iter().map(|n| (n.visits, n.reward)).collect();
            tree.iterate(1.0, &mut rng);

            // Nodes whose visit count moved form the path from the root to
            // the playout's start, in creation order.
            let path: Vec<NodeId> = tree
                .ids()
                .filter(|&id| {
                    before
                        .get(id)
                        .is_none_or(|&(v, _)| tree.node(id).visits > v)
                })
                .collect();
            assert!(path.len() >= 3, "path {path:?}");
            assert_eq!(path[0], ROOT);
            for pair in path.windows(2) {
                assert_eq!(tree.node(pair[1]).parent, Some(pair[0]));
            }

            let gained =
                |id: NodeId| tree.node(id).reward - before.get(id).map_or(0.0, |&(_, r)| r);
            let r = gained(ROOT);
            assert!(r == 0.0 || r == 1.0);
            for &id in &path {
                assert_eq!(gained(id), r, "node {id} at depth {}", path.len());
            }

            let leaf = tree.node(path[path.len() - 1]);
            if leaf.is_terminal() {
                // Whoever took the last token won.
                saw_terminal = true;
                assert_eq!(r == 1.0, leaf.player == tree.root_player());
            }
        }
        assert!(saw_terminal);
    }

    #[test]
    fn test_children_alternate_players() {
        let config = SearchConfig::new(100, 1.0).unwrap();
        let mut rng = fastrand::Rng::with_seed(11);
        let tree = tree_search(&FourInARow, Board::new(), Player::Two, &config, &mut rng);
        assert_eq!(tree.root().player, Player::One);
        for id in tree.ids().skip(1) {
            let node = tree.node(id);
            let parent = tree.node(node.parent.unwrap());
            assert_eq!(node.player, parent.player.opponent());
            assert_eq!(node.state.filled(), parent.state.filled() + 1);
        }
    }

    #[test]
    fn test_zero_simulations_leaves_root_bare() {
        let config = SearchConfig::new(0, 1.0).unwrap();
        let mut rng = fastrand::Rng::with_seed(1);
        let tree = tree_search(&FourInARow, Board::new(), Player::One, &config, &mut rng);
        assert_eq!(tree.ids().count(), 1);
        assert_eq!(tree.best_move(None), None);
    }

    #[test]
    fn test_best_move_respects_filter() {
        let config = SearchConfig::new(200, 1.0).unwrap();
        let mut rng = fastrand::Rng::with_seed(5);
        let tree = tree_search(&FourInARow, Board::new(), Player::One, &config, &mut rng);

        let only = [Move::new(2, 1, 0)];
        assert_eq!(tree.best_move(Some(&only)), Some(Move::new(2, 1, 0)));

        // A filter matching no child falls back to every child.
        let none = [Move::new(0, 0, 3)];
        assert_eq!(tree.best_move(Some(&none)), tree.best_move(None));
    }

    #[test]
    fn test_substitute_game() {
        let config = SearchConfig::new(300, 1.4).unwrap();
        let mut rng = fastrand::Rng::with_seed(9);
        let tree = tree_search(&Countdown, 6u8, Player::One, &config, &mut rng);
        assert_eq!(tree.root().visits, 300);
        assert_eq!(tree.root().children.len(), 2);
        assert_visits_conserved(&tree);
        // Terminal nodes are revisited but never expanded.
        assert!(tree.ids().any(|id| tree.node(id).is_terminal()));
        assert!(
            tree.ids()
                .filter(|&id| tree.node(id).is_terminal())
                .all(|id| tree.node(id).children.is_empty())
        );
    }

    #[test]
    fn test_same_seed_same_tree() {
        let config = SearchConfig::new(150, 0.7).unwrap();
        let run = |seed| {
            let mut rng = fastrand::Rng::with_seed(seed);
            let tree = tree_search(&FourInARow, Board::new(), Player::One, &config, &mut rng);
            let visits: Vec<u32> = tree.ids().map(|id| tree.node(id).visits).collect();
            (tree.best_move(None), visits)
        };
        assert_eq!(run(21), run(21));
    }

    #[test]
    #[should_panic(expected = "terminal state")]
    fn test_search_on_terminal_state_panics() {
        let config = SearchConfig::default();
        let mut rng = fastrand::Rng::with_seed(1);
        tree_search(&Countdown, 0u8, Player::One, &config, &mut rng);
    }

    #[test]
    fn test_move_in() {
        let mut rng = fastrand::Rng::with_seed(2);
        let mut tree = SearchTree::new(&Countdown, 3u8, Player::One);
        let child = tree.expand(ROOT, &mut rng);
        let mv = tree.node(child).move_in();
        assert!(mv == 1 || mv == 2);
        assert_eq!(tree.node(child).state, 3 - mv);
    }

    #[test]
    #[should_panic(expected = "root node has no move")]
    fn test_move_in_on_root_panics() {
        let tree = SearchTree::new(&Countdown, 3u8, Player::One);
        tree.root().move_in();
    }
}
