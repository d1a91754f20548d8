use std::fmt;

use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::error::GameError;

/// Side length of the square maze.
pub const GRID_SIZE: u32 = 15;

pub const START: Position = Position { x: 1, y: 1 };
pub const GOAL: Position = Position {
    x: GRID_SIZE - 2,
    y: GRID_SIZE - 2,
};

// Internal wall segments: (fixed row/column, two gaps).
// Rows are laid first, columns second, so a column may close a row gap.
const WALL_ROWS: [(u32, [u32; 2]); 3] = [(3, [5, 8]), (6, [3, 7]), (9, [4, 9])];
const WALL_COLS: [(u32, [u32; 2]); 3] = [(4, [4, 7]), (7, [2, 8]), (10, [5, 10])];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellKind {
    Empty,
    Wall,
    Start,
    Goal,
}

impl CellKind {
    pub fn glyph(self) -> char {
        match self {
            CellKind::Empty => '.',
            CellKind::Wall => '#',
            CellKind::Start => 'S',
            CellKind::Goal => 'G',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

impl Position {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MoveResult {
    pub moved: bool,
    pub reached_goal: bool,
}

/// Owned copy of the maze handed to renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MazeSnapshot {
    pub size: u32,
    pub cells: Vec<CellKind>,
    pub player: Position,
}

impl MazeSnapshot {
    pub fn cell(&self, x: u32, y: u32) -> Option<CellKind> {
        if x >= self.size || y >= self.size {
            return None;
        }
        self.cells.get((y * self.size + x) as usize).copied()
    }
}

/// Authoritative maze state: the grid plus the player token.
#[derive(Debug, Clone)]
pub struct GridMaze {
    cells: Vec<CellKind>,
    player: Position,
}

impl GridMaze {
    pub fn new() -> Self {
        let mut maze = Self {
            cells: vec![CellKind::Empty; (GRID_SIZE * GRID_SIZE) as usize],
            player: START,
        };
        maze.initialize();
        maze
    }

    /// Restore the hand-authored layout with Start and Goal markers.
    ///
    /// The player position is left untouched; see [`GridMaze::reset`].
    pub fn initialize(&mut self) {
        let last = GRID_SIZE - 1;
        for y in 0..GRID_SIZE {
            for x in 0..GRID_SIZE {
                let border = x == 0 || y == 0 || x == last || y == last;
                let kind = if border {
                    CellKind::Wall
                } else {
                    CellKind::Empty
                };
                self.set(x, y, kind);
            }
        }

        for (y, gaps) in WALL_ROWS {
            for x in 2..GRID_SIZE - 2 {
                if !gaps.contains(&x) {
                    self.set(x, y, CellKind::Wall);
                }
            }
        }
        for (x, gaps) in WALL_COLS {
            for y in 2..GRID_SIZE - 2 {
                if !gaps.contains(&y) {
                    self.set(x, y, CellKind::Wall);
                }
            }
        }

        self.set(START.x, START.y, CellKind::Start);
        self.set(GOAL.x, GOAL.y, CellKind::Goal);
    }

    /// Put the player back on the start cell and rebuild the layout.
    pub fn reset(&mut self) {
        self.player = START;
        self.initialize();
    }

    pub fn attempt_move(&mut self, direction: Direction) -> MoveResult {
        let Some((dx, dy)) = direction.offset() else {
            return MoveResult::default();
        };

        // Clamp before the wall check so a move can never leave the grid.
        let last = (GRID_SIZE - 1) as i64;
        let nx = (self.player.x as i64 + dx as i64).clamp(0, last) as u32;
        let ny = (self.player.y as i64 + dy as i64).clamp(0, last) as u32;
        let dest = Position::new(nx, ny);

        if dest == self.player || self.kind_at(dest) == CellKind::Wall {
            return MoveResult::default();
        }

        if self.kind_at(self.player) == CellKind::Start {
            self.set(self.player.x, self.player.y, CellKind::Empty);
        }
        self.player = dest;

        MoveResult {
            moved: true,
            reached_goal: self.kind_at(dest) == CellKind::Goal,
        }
    }

    pub fn player(&self) -> Position {
        self.player
    }

    pub fn goal(&self) -> Position {
        GOAL
    }

    pub fn cell(&self, x: i32, y: i32) -> Result<CellKind, GameError> {
        let n = GRID_SIZE as i32;
        if !(0..n).contains(&x) || !(0..n).contains(&y) {
            return Err(GameError::OutOfBounds { x, y });
        }
        Ok(self.kind_at(Position::new(x as u32, y as u32)))
    }

    pub fn is_wall(&self, x: i32, y: i32) -> bool {
        // Treat out-of-bounds as solid.
        self.cell(x, y).map_or(true, |c| c == CellKind::Wall)
    }

    pub fn snapshot(&self) -> MazeSnapshot {
        MazeSnapshot {
            size: GRID_SIZE,
            cells: self.cells.clone(),
            player: self.player,
        }
    }

    #[cfg(test)]
    pub(crate) fn place_player(&mut self, pos: Position) {
        assert_ne!(self.kind_at(pos), CellKind::Wall, "player placed on a wall");
        self.player = pos;
    }

    fn idx(x: u32, y: u32) -> usize {
        (y as usize) * (GRID_SIZE as usize) + (x as usize)
    }

    fn kind_at(&self, pos: Position) -> CellKind {
        self.cells[Self::idx(pos.x, pos.y)]
    }

    fn set(&mut self, x: u32, y: u32, kind: CellKind) {
        self.cells[Self::idx(x, y)] = kind;
    }
}

impl Default for GridMaze {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GridMaze {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..GRID_SIZE {
            for x in 0..GRID_SIZE {
                let glyph = if self.player == Position::new(x, y) {
                    'P'
                } else {
                    self.kind_at(Position::new(x, y)).glyph()
                };
                write!(f, "{glyph}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYOUT: &str = "\
###############
#S............#
#...#.....#...#
#.###.##.####.#
#......#..#...#
#...#..#......#
#.#.#########.#
#......#..#...#
#...#.....#...#
#.#######.###.#
#...#..#......#
#...#..#..#...#
#...#..#..#...#
#............G#
###############
";

    fn render_cells(maze: &GridMaze) -> String {
        let snap = maze.snapshot();
        let mut out = String::new();
        for y in 0..snap.size {
            for x in 0..snap.size {
                out.push(snap.cell(x, y).unwrap().glyph());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn initial_layout_is_fixed() {
        let maze = GridMaze::new();
        assert_eq!(render_cells(&maze), LAYOUT);
        assert_eq!(maze.player(), START);
        assert_eq!(maze.goal(), Position::new(13, 13));
    }

    #[test]
    fn border_is_solid_and_markers_are_unique() {
        let maze = GridMaze::new();
        let n = GRID_SIZE as i32;
        for i in 0..n {
            assert!(maze.is_wall(i, 0));
            assert!(maze.is_wall(i, n - 1));
            assert!(maze.is_wall(0, i));
            assert!(maze.is_wall(n - 1, i));
        }
        let cells = maze.snapshot().cells;
        assert_eq!(cells.iter().filter(|c| **c == CellKind::Start).count(), 1);
        assert_eq!(cells.iter().filter(|c| **c == CellKind::Goal).count(), 1);
    }

    #[test]
    fn moves_into_walls_are_rejected_everywhere() {
        let mut maze = GridMaze::new();
        let n = GRID_SIZE as i32;
        for y in 0..n {
            for x in 0..n {
                if maze.is_wall(x, y) {
                    continue;
                }
                for d in [
                    Direction::Up,
                    Direction::Down,
                    Direction::Left,
                    Direction::Right,
                ] {
                    let (dx, dy) = d.offset().unwrap();
                    if !maze.is_wall(x + dx, y + dy) {
                        continue;
                    }
                    let pos = Position::new(x as u32, y as u32);
                    maze.place_player(pos);
                    let res = maze.attempt_move(d);
                    assert!(!res.moved, "{d} from {pos} went through a wall");
                    assert_eq!(maze.player(), pos);
                }
            }
        }
    }

    #[test]
    fn neutral_is_a_no_op() {
        let mut maze = GridMaze::new();
        assert_eq!(maze.attempt_move(Direction::Neutral), MoveResult::default());
        assert_eq!(maze.player(), START);
        assert_eq!(maze.cell(1, 1), Ok(CellKind::Start));
    }

    #[test]
    fn leaving_start_clears_the_marker() {
        let mut maze = GridMaze::new();
        let res = maze.attempt_move(Direction::Right);
        assert!(res.moved);
        assert!(!res.reached_goal);
        assert_eq!(maze.player(), Position::new(2, 1));
        assert_eq!(maze.cell(1, 1), Ok(CellKind::Empty));

        // Walking back does not resurrect it.
        maze.attempt_move(Direction::Left);
        assert_eq!(maze.cell(1, 1), Ok(CellKind::Empty));
    }

    #[test]
    fn border_moves_never_leave_the_grid() {
        let mut maze = GridMaze::new();
        for d in [Direction::Up, Direction::Left] {
            let res = maze.attempt_move(d);
            assert!(!res.moved);
            assert_eq!(maze.player(), START);
        }
        // Every in-bounds lookup around the player succeeds; OutOfBounds is
        // only reachable through explicit out-of-range coordinates.
        assert_eq!(maze.cell(-1, 0), Err(GameError::OutOfBounds { x: -1, y: 0 }));
        assert_eq!(
            maze.cell(0, GRID_SIZE as i32),
            Err(GameError::OutOfBounds { x: 0, y: 15 })
        );
    }

    #[test]
    fn stepping_onto_goal_reports_it() {
        let mut maze = GridMaze::new();
        maze.place_player(Position::new(12, 13));
        let res = maze.attempt_move(Direction::Right);
        assert_eq!(
            res,
            MoveResult {
                moved: true,
                reached_goal: true
            }
        );
        assert_eq!(maze.player(), GOAL);
    }

    #[test]
    fn reset_restores_pristine_state() {
        let mut maze = GridMaze::new();
        maze.attempt_move(Direction::Right);
        maze.attempt_move(Direction::Right);
        assert_eq!(maze.cell(1, 1), Ok(CellKind::Empty));

        maze.reset();
        assert_eq!(maze.player(), START);
        assert_eq!(render_cells(&maze), LAYOUT);
    }

    #[test]
    fn display_marks_the_player() {
        let maze = GridMaze::new();
        let text = maze.to_string();
        let second_row = text.lines().nth(1).unwrap();
        assert_eq!(second_row, "#P............#");
    }
}
