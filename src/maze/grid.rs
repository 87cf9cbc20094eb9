use super::{ExpansionCounter, Maze};
use crate::core::errors::{Result, SolverError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A position in a [`GridMaze`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Whether `other` is one orthogonal step away
    pub fn is_adjacent(&self, other: &Cell) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tile {
    Wall,
    Open,
    Goal,
}

/// Rectangular maze read from ASCII art
///
/// `#` is a wall, `.` or space is open floor, `S` marks the single start
/// and `*` marks a goal. Neighbors are listed north, east, south, west.
#[derive(Debug)]
pub struct GridMaze {
    tiles: Vec<Vec<Tile>>,
    start: Cell,
    width: usize,
    expansions: ExpansionCounter<Cell>,
}

impl GridMaze {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SolverError::io(format!("read maze {}", path.display()), e))?;
        text.parse()
    }

    pub fn height(&self) -> usize {
        self.tiles.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_open(&self, cell: &Cell) -> bool {
        self.tile(cell).is_some_and(|t| t != Tile::Wall)
    }

    pub fn goals(&self) -> Vec<Cell> {
        let mut out = Vec::new();
        for (row, line) in self.tiles.iter().enumerate() {
            for (col, tile) in line.iter().enumerate() {
                if *tile == Tile::Goal {
                    out.push(Cell::new(row, col));
                }
            }
        }
        out
    }

    /// Per-cell neighbor query counts
    pub fn expansions(&self) -> &ExpansionCounter<Cell> {
        &self.expansions
    }

    /// Render the maze with `path` drawn as `o`
    pub fn render_path(&self, path: &[Cell]) -> String {
        let mut canvas: Vec<Vec<char>> = self
            .tiles
            .iter()
            .map(|line| {
                line.iter()
                    .map(|tile| match tile {
                        Tile::Wall => '#',
                        Tile::Open => '.',
                        Tile::Goal => '*',
                    })
                    .collect()
            })
            .collect();
        // Cells outside the grid are skipped
        for cell in path {
            if let Some(slot) = canvas.get_mut(cell.row).and_then(|line| line.get_mut(cell.col)) {
                *slot = 'o';
            }
        }
        canvas[self.start.row][self.start.col] = 'S';

        let mut out = String::new();
        for line in canvas {
            out.extend(line);
            out.push('\n');
        }
        out
    }

    fn tile(&self, cell: &Cell) -> Option<Tile> {
        self.tiles.get(cell.row)?.get(cell.col).copied()
    }
}

impl FromStr for GridMaze {
    type Err = SolverError;

    fn from_str(text: &str) -> Result<Self> {
        let lines: Vec<&str> = text.trim_end_matches(['\n', '\r']).lines().collect();
        if lines.is_empty() {
            return Err(SolverError::maze_format("grid maze is empty"));
        }

        let width = lines[0].chars().count();
        let mut tiles = Vec::with_capacity(lines.len());
        let mut start = None;

        for (row, line) in lines.iter().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.chars().count() != width {
                return Err(SolverError::maze_format_at(
                    format!("expected {} columns", width),
                    row + 1,
                ));
            }

            let mut parsed = Vec::with_capacity(width);
            for (col, ch) in line.chars().enumerate() {
                let tile = match ch {
                    '#' => Tile::Wall,
                    '.' | ' ' => Tile::Open,
                    '*' => Tile::Goal,
                    'S' => {
                        if start.replace(Cell::new(row, col)).is_some() {
                            return Err(SolverError::maze_format_at(
                                "more than one start cell",
                                row + 1,
                            ));
                        }
                        Tile::Open
                    }
                    other => {
                        return Err(SolverError::maze_format_at(
                            format!("unexpected character {:?}", other),
                            row + 1,
                        ))
                    }
                };
                parsed.push(tile);
            }
            tiles.push(parsed);
        }

        let start = start.ok_or_else(|| SolverError::maze_format("grid maze has no start cell"))?;
        Ok(Self {
            tiles,
            start,
            width,
            expansions: ExpansionCounter::new(),
        })
    }
}

impl Maze for GridMaze {
    type Node = Cell;

    fn origin(&self) -> Cell {
        self.start
    }

    fn neighbors(&self, node: &Cell) -> anyhow::Result<Vec<Cell>> {
        if !self.is_open(node) {
            anyhow::bail!("Cell {} is not an open cell", node);
        }
        self.expansions.record(node);

        let mut out = Vec::with_capacity(4);
        let candidates = [
            node.row.checked_sub(1).map(|r| Cell::new(r, node.col)),
            Some(Cell::new(node.row, node.col + 1)),
            Some(Cell::new(node.row + 1, node.col)),
            node.col.checked_sub(1).map(|c| Cell::new(node.row, c)),
        ];
        for cell in candidates.into_iter().flatten() {
            if self.is_open(&cell) {
                out.push(cell);
            }
        }
        Ok(out)
    }

    fn is_goal(&self, node: &Cell) -> bool {
        self.tile(node) == Some(Tile::Goal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SMALL: &str = "\
#####
#S..#
#.#*#
#####
";

    #[test]
    fn test_parse_small_grid() {
        let maze: GridMaze = SMALL.parse().unwrap();
        assert_eq!(maze.height(), 4);
        assert_eq!(maze.width(), 5);
        assert_eq!(maze.origin(), Cell::new(1, 1));
        assert_eq!(maze.goals(), vec![Cell::new(2, 3)]);
    }

    #[test]
    fn test_neighbors_in_compass_order() {
        let maze: GridMaze = SMALL.parse().unwrap();
        assert_eq!(
            maze.neighbors(&Cell::new(1, 1)).unwrap(),
            vec![Cell::new(1, 2), Cell::new(2, 1)]
        );
        assert_eq!(
            maze.neighbors(&Cell::new(1, 3)).unwrap(),
            vec![Cell::new(2, 3), Cell::new(1, 2)]
        );
        assert!(maze.neighbors(&Cell::new(0, 0)).is_err());
    }

    #[test]
    fn test_edges_of_grid_have_no_outside_neighbors() {
        let maze: GridMaze = "S.\n.*\n".parse().unwrap();
        assert_eq!(
            maze.neighbors(&Cell::new(0, 0)).unwrap(),
            vec![Cell::new(0, 1), Cell::new(1, 0)]
        );
    }

    #[test]
    fn test_parse_errors() {
        let err = "#.#\n".parse::<GridMaze>().unwrap_err();
        assert!(err.to_string().contains("no start"));

        let err = "S.\nS.\n".parse::<GridMaze>().unwrap_err();
        assert!(matches!(err, SolverError::MazeFormat { line: Some(2), .. }));

        let err = "S..\n.\n".parse::<GridMaze>().unwrap_err();
        assert!(matches!(err, SolverError::MazeFormat { line: Some(2), .. }));

        let err = "S?\n".parse::<GridMaze>().unwrap_err();
        assert!(err.to_string().contains("Invalid maze definition"));

        assert!("".parse::<GridMaze>().is_err());
    }

    #[test]
    fn test_render_path() {
        let maze: GridMaze = SMALL.parse().unwrap();
        let path = [Cell::new(1, 1), Cell::new(1, 2), Cell::new(1, 3), Cell::new(2, 3)];
        assert_eq!(maze.render_path(&path), "#####\n#Soo#\n#.#o#\n#####\n");
    }

    #[test]
    fn test_render_path_skips_cells_outside_grid() {
        let maze: GridMaze = SMALL.parse().unwrap();
        let path = [Cell::new(1, 1), Cell::new(1, 2), Cell::new(1, 9), Cell::new(7, 0)];
        assert_eq!(maze.render_path(&path), "#####\n#So.#\n#.#*#\n#####\n");
    }

    #[test]
    fn test_cell_adjacency() {
        assert!(Cell::new(1, 1).is_adjacent(&Cell::new(1, 2)));
        assert!(Cell::new(1, 1).is_adjacent(&Cell::new(0, 1)));
        assert!(!Cell::new(1, 1).is_adjacent(&Cell::new(2, 2)));
        assert!(!Cell::new(1, 1).is_adjacent(&Cell::new(1, 1)));
    }
}
