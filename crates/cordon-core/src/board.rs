//! Board representation: the city graph, plague cubes, and markers.
//!
//! This module contains:
//! - Plague colors and per-field cube counts
//! - Fields (city graph nodes) with adjacency, laboratories, and antidote markers
//! - Static map atlases (`MapType::World`, `MapType::Mini`)
//! - Board query and mutation helpers

use serde::{Deserialize, Serialize};

/// Player identifier (0-3 for a 4-player game)
pub type PlayerId = u8;

/// Field identifier: index into `Board::fields`
pub type FieldId = usize;

/// Plague colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlagueColor {
    Red,
    Yellow,
    Blue,
    Black,
}

impl PlagueColor {
    /// All plague colors
    pub const ALL: [PlagueColor; 4] = [
        PlagueColor::Red,
        PlagueColor::Yellow,
        PlagueColor::Blue,
        PlagueColor::Black,
    ];

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            PlagueColor::Red => "red",
            PlagueColor::Yellow => "yellow",
            PlagueColor::Blue => "blue",
            PlagueColor::Black => "black",
        }
    }
}

/// Per-color cube counts on one field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CubeSet {
    pub red: u8,
    pub yellow: u8,
    pub blue: u8,
    pub black: u8,
}

impl CubeSet {
    /// Create an empty cube set
    pub fn new() -> Self {
        Self::default()
    }

    /// Get count for a color
    pub fn get(&self, color: PlagueColor) -> u8 {
        match color {
            PlagueColor::Red => self.red,
            PlagueColor::Yellow => self.yellow,
            PlagueColor::Blue => self.blue,
            PlagueColor::Black => self.black,
        }
    }

    /// Set count for a color
    pub fn set(&mut self, color: PlagueColor, count: u8) {
        match color {
            PlagueColor::Red => self.red = count,
            PlagueColor::Yellow => self.yellow = count,
            PlagueColor::Blue => self.blue = count,
            PlagueColor::Black => self.black = count,
        }
    }

    /// Add cubes of a color
    pub fn add(&mut self, color: PlagueColor, amount: u8) {
        self.set(color, self.get(color) + amount);
    }

    /// Remove up to `amount` cubes of a color, returning how many came off
    pub fn remove(&mut self, color: PlagueColor, amount: u8) -> u8 {
        let current = self.get(color);
        let removed = current.min(amount);
        self.set(color, current - removed);
        removed
    }

    /// Total cubes across all colors
    pub fn total(&self) -> u32 {
        self.red as u32 + self.yellow as u32 + self.blue as u32 + self.black as u32
    }

    /// Whether no cubes are present
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// A node in the board graph: one city
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    /// Index into `Board::fields`
    pub id: FieldId,
    /// City name
    pub city: String,
    /// Native plague color of this city
    pub color: PlagueColor,
    /// Adjacent fields
    pub neighbors: Vec<FieldId>,
    /// Plague cubes currently on this field
    pub cubes: CubeSet,
    /// At most one research laboratory per field
    pub has_research_lab: bool,
    /// Antidote marker placed when a plague was cured here
    pub antidote_marker: Option<PlagueColor>,
}

/// Which static map a game is played on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapType {
    /// 24 cities in four colors
    World,
    /// 8 cities, for tutorials and tests
    Mini,
}

/// City list for the world map: (name, color), index = FieldId
const WORLD_CITIES: [(&str, PlagueColor); 24] = [
    ("Atlanta", PlagueColor::Blue),
    ("Chicago", PlagueColor::Blue),
    ("Montreal", PlagueColor::Blue),
    ("New York", PlagueColor::Blue),
    ("Washington", PlagueColor::Blue),
    ("London", PlagueColor::Blue),
    ("Los Angeles", PlagueColor::Yellow),
    ("Mexico City", PlagueColor::Yellow),
    ("Miami", PlagueColor::Yellow),
    ("Bogota", PlagueColor::Yellow),
    ("Lima", PlagueColor::Yellow),
    ("Lagos", PlagueColor::Yellow),
    ("Moscow", PlagueColor::Black),
    ("Istanbul", PlagueColor::Black),
    ("Cairo", PlagueColor::Black),
    ("Baghdad", PlagueColor::Black),
    ("Karachi", PlagueColor::Black),
    ("Delhi", PlagueColor::Black),
    ("Beijing", PlagueColor::Red),
    ("Seoul", PlagueColor::Red),
    ("Shanghai", PlagueColor::Red),
    ("Tokyo", PlagueColor::Red),
    ("Hong Kong", PlagueColor::Red),
    ("Sydney", PlagueColor::Red),
];

/// Undirected links for the world map
const WORLD_LINKS: &[(FieldId, FieldId)] = &[
    (0, 1),   // Atlanta - Chicago
    (0, 4),   // Atlanta - Washington
    (0, 8),   // Atlanta - Miami
    (1, 2),   // Chicago - Montreal
    (1, 6),   // Chicago - Los Angeles
    (1, 7),   // Chicago - Mexico City
    (2, 3),   // Montreal - New York
    (2, 4),   // Montreal - Washington
    (3, 4),   // New York - Washington
    (3, 5),   // New York - London
    (4, 8),   // Washington - Miami
    (5, 13),  // London - Istanbul
    (6, 7),   // Los Angeles - Mexico City
    (6, 21),  // Los Angeles - Tokyo
    (6, 23),  // Los Angeles - Sydney
    (7, 8),   // Mexico City - Miami
    (7, 9),   // Mexico City - Bogota
    (7, 10),  // Mexico City - Lima
    (8, 9),   // Miami - Bogota
    (9, 10),  // Bogota - Lima
    (9, 11),  // Bogota - Lagos
    (11, 14), // Lagos - Cairo
    (12, 13), // Moscow - Istanbul
    (12, 16), // Moscow - Karachi
    (13, 14), // Istanbul - Cairo
    (13, 15), // Istanbul - Baghdad
    (14, 15), // Cairo - Baghdad
    (15, 16), // Baghdad - Karachi
    (16, 17), // Karachi - Delhi
    (17, 22), // Delhi - Hong Kong
    (18, 19), // Beijing - Seoul
    (18, 20), // Beijing - Shanghai
    (19, 20), // Seoul - Shanghai
    (19, 21), // Seoul - Tokyo
    (20, 21), // Shanghai - Tokyo
    (20, 22), // Shanghai - Hong Kong
    (21, 23), // Tokyo - Sydney
    (22, 23), // Hong Kong - Sydney
];

/// City list for the mini map
const MINI_CITIES: [(&str, PlagueColor); 8] = [
    ("Oslo", PlagueColor::Blue),
    ("Bergen", PlagueColor::Blue),
    ("Accra", PlagueColor::Yellow),
    ("Dakar", PlagueColor::Yellow),
    ("Amman", PlagueColor::Black),
    ("Muscat", PlagueColor::Black),
    ("Hanoi", PlagueColor::Red),
    ("Manila", PlagueColor::Red),
];

/// Undirected links for the mini map: a ring plus two chords
const MINI_LINKS: &[(FieldId, FieldId)] = &[
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 4),
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 0),
    (0, 4),
    (2, 6),
];

/// The game board: a graph of city fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    /// Which static map this board was built from
    pub map_type: MapType,
    /// All fields, indexed by `FieldId`
    pub fields: Vec<Field>,
}

impl Board {
    /// Build a board from a static map atlas
    pub fn new(map_type: MapType) -> Self {
        let (cities, links): (&[(&str, PlagueColor)], &[(FieldId, FieldId)]) = match map_type {
            MapType::World => (&WORLD_CITIES, WORLD_LINKS),
            MapType::Mini => (&MINI_CITIES, MINI_LINKS),
        };

        let mut fields: Vec<Field> = cities
            .iter()
            .enumerate()
            .map(|(id, (city, color))| Field {
                id,
                city: (*city).to_string(),
                color: *color,
                neighbors: Vec::new(),
                cubes: CubeSet::new(),
                has_research_lab: false,
                antidote_marker: None,
            })
            .collect();

        for &(a, b) in links {
            fields[a].neighbors.push(b);
            fields[b].neighbors.push(a);
        }

        Self { map_type, fields }
    }

    /// Number of fields on the board
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Get a field by id
    pub fn field(&self, id: FieldId) -> Option<&Field> {
        self.fields.get(id)
    }

    /// Get a mutable field by id
    pub(crate) fn field_mut(&mut self, id: FieldId) -> Option<&mut Field> {
        self.fields.get_mut(id)
    }

    /// Neighbors of a field (empty slice for an unknown id)
    pub fn neighbors(&self, id: FieldId) -> &[FieldId] {
        self.fields
            .get(id)
            .map(|f| f.neighbors.as_slice())
            .unwrap_or(&[])
    }

    /// All fields currently holding a research laboratory
    pub fn lab_fields(&self) -> Vec<FieldId> {
        self.fields
            .iter()
            .filter(|f| f.has_research_lab)
            .map(|f| f.id)
            .collect()
    }

    /// Number of laboratories on the board
    pub fn lab_count(&self) -> u32 {
        self.fields.iter().filter(|f| f.has_research_lab).count() as u32
    }

    /// Total cubes of one color across the whole board
    pub fn cubes_on_board(&self, color: PlagueColor) -> u32 {
        self.fields.iter().map(|f| f.cubes.get(color) as u32).sum()
    }

    /// Where every player starts; also receives the first laboratory
    pub fn start_field(&self) -> FieldId {
        0
    }
}
