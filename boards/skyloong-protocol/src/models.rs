//! Model identification and per-model key layouts.

use skyloong_sync_core::{BoardError, LedInfo, MatrixMap, Result};

/// Byte range of the little-endian model id inside an info response
pub const MODEL_ID_RANGE: std::ops::Range<usize> = 8..12;

/// Matrix height shared by all models
pub const MATRIX_HEIGHT: usize = 6;
/// Matrix width shared by all models
pub const MATRIX_WIDTH: usize = 22;

/// A key on the keyboard matrix and the led behind it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key {
    pub row: u8,
    pub col: u8,
    /// Device assigned led offset, in units of 4 bytes in the led memory image
    pub led: u8,
    pub name: &'static str,
}

impl Key {
    pub const fn new(row: u8, col: u8, led: u8, name: &'static str) -> Self {
        Self {
            row,
            col,
            led,
            name,
        }
    }

    pub fn info(&self) -> LedInfo {
        LedInfo {
            name: self.name,
            index: self.led,
        }
    }
}

const fn key(row: u8, col: u8, led: u8, name: &'static str) -> Key {
    Key::new(row, col, led, name)
}

/// A supported keyboard model
#[derive(Debug, PartialEq, Eq)]
pub struct Model {
    pub id: u32,
    pub name: &'static str,
    pub keys: &'static [Key],
}

impl Model {
    /// Row/column map of this model's keys
    pub fn matrix(&self) -> MatrixMap {
        matrix_map(self.keys)
    }
}

/// Every model this driver knows how to light
pub static MODELS: &[Model] = &[
    Model {
        id: 656802051,
        name: "Skyloong GK104 Pro",
        keys: GK104_KEYS,
    },
    Model {
        id: 656802008,
        name: "Skyloong GK980",
        keys: GK980_KEYS,
    },
    Model {
        id: 656802031,
        name: "Skyloong GK61",
        keys: GK61_KEYS,
    },
    Model {
        id: 656802032,
        name: "Skyloong GK61",
        keys: GK61_KEYS,
    },
];

/// Look up a model by exact id
pub fn find_model(id: u32) -> Option<&'static Model> {
    MODELS.iter().find(|m| m.id == id)
}

/// Extract the model id from an info response
pub fn parse_model_id(response: &[u8]) -> Result<u32> {
    let bytes = response
        .get(MODEL_ID_RANGE)
        .ok_or(BoardError::ShortRead {
            read: response.len(),
            expected: MODEL_ID_RANGE.end,
        })?;
    let mut raw = [0u8; 4];
    raw.copy_from_slice(bytes);
    Ok(u32::from_le_bytes(raw))
}

/// Build the matrix map for a key table. Cells hold positions in `keys`.
pub fn matrix_map(keys: &[Key]) -> MatrixMap {
    let mut cells = vec![None; MATRIX_HEIGHT * MATRIX_WIDTH];
    for (i, key) in keys.iter().enumerate() {
        let (row, col) = (key.row as usize, key.col as usize);
        if row < MATRIX_HEIGHT && col < MATRIX_WIDTH {
            cells[row * MATRIX_WIDTH + col] = Some(i);
        }
    }
    MatrixMap {
        height: MATRIX_HEIGHT,
        width: MATRIX_WIDTH,
        cells,
    }
}

/* KEY LAYOUTS */

pub const GK104_KEYS: &[Key] = &[
    key(0, 0, 0, "Key: Escape"),
    key(0, 2, 2, "Key: F1"),
    key(0, 3, 3, "Key: F2"),
    key(0, 4, 4, "Key: F3"),
    key(0, 5, 5, "Key: F4"),
    key(0, 7, 7, "Key: F5"),
    key(0, 8, 8, "Key: F6"),
    key(0, 9, 9, "Key: F7"),
    key(0, 10, 10, "Key: F8"),
    key(0, 11, 11, "Key: F9"),
    key(0, 12, 12, "Key: F10"),
    key(0, 13, 13, "Key: F11"),
    key(0, 14, 14, "Key: F12"),
    key(0, 15, 15, "Key: Print Screen"),
    key(0, 16, 16, "Key: Scroll Lock"),
    key(0, 17, 17, "Key: Pause/Break"),
    key(1, 0, 22, "Key: `"),
    key(1, 1, 23, "Key: 1"),
    key(1, 2, 24, "Key: 2"),
    key(1, 3, 25, "Key: 3"),
    key(1, 4, 26, "Key: 4"),
    key(1, 5, 27, "Key: 5"),
    key(1, 6, 28, "Key: 6"),
    key(1, 7, 29, "Key: 7"),
    key(1, 8, 30, "Key: 8"),
    key(1, 9, 31, "Key: 9"),
    key(1, 10, 32, "Key: 0"),
    key(1, 11, 33, "Key: -"),
    key(1, 12, 34, "Key: ="),
    key(1, 14, 36, "Key: Backspace"),
    key(1, 15, 37, "Key: Insert"),
    key(1, 16, 38, "Key: Home"),
    key(1, 17, 39, "Key: Page Up"),
    key(1, 18, 40, "Key: Num Lock"),
    key(1, 19, 41, "Key: Number Pad /"),
    key(1, 20, 42, "Key: Number Pad *"),
    key(1, 21, 43, "Key: Number Pad -"),
    key(2, 0, 44, "Key: Tab"),
    key(2, 1, 45, "Key: Q"),
    key(2, 2, 46, "Key: W"),
    key(2, 3, 47, "Key: E"),
    key(2, 4, 48, "Key: R"),
    key(2, 5, 49, "Key: T"),
    key(2, 6, 50, "Key: Y"),
    key(2, 7, 51, "Key: U"),
    key(2, 8, 52, "Key: I"),
    key(2, 9, 53, "Key: O"),
    key(2, 10, 54, "Key: P"),
    key(2, 11, 55, "Key: ["),
    key(2, 12, 56, "Key: ]"),
    key(2, 14, 58, "Key: \\ (ANSI)"),
    key(2, 15, 59, "Key: Delete"),
    key(2, 16, 60, "Key: End"),
    key(2, 17, 61, "Key: Page Down"),
    key(2, 18, 62, "Key: Number Pad 7"),
    key(2, 19, 63, "Key: Number Pad 8"),
    key(2, 20, 64, "Key: Number Pad 9"),
    key(2, 21, 65, "Key: Number Pad +"),
    key(3, 0, 66, "Key: Caps Lock"),
    key(3, 1, 67, "Key: A"),
    key(3, 2, 68, "Key: S"),
    key(3, 3, 69, "Key: D"),
    key(3, 4, 70, "Key: F"),
    key(3, 5, 71, "Key: G"),
    key(3, 6, 72, "Key: H"),
    key(3, 7, 73, "Key: J"),
    key(3, 8, 74, "Key: K"),
    key(3, 9, 75, "Key: L"),
    key(3, 10, 76, "Key: ;"),
    key(3, 11, 77, "Key: '"),
    key(3, 12, 78, "Key: #"),
    key(3, 13, 79, "Key: Enter"),
    key(3, 18, 84, "Key: Number Pad 4"),
    key(3, 19, 85, "Key: Number Pad 5"),
    key(3, 20, 86, "Key: Number Pad 6"),
    key(4, 0, 88, "Key: Left Shift"),
    key(4, 2, 90, "Key: Z"),
    key(4, 3, 91, "Key: X"),
    key(4, 4, 92, "Key: C"),
    key(4, 5, 93, "Key: V"),
    key(4, 6, 94, "Key: B"),
    key(4, 7, 95, "Key: N"),
    key(4, 8, 96, "Key: M"),
    key(4, 9, 97, "Key: ,"),
    key(4, 10, 98, "Key: ."),
    key(4, 11, 99, "Key: /"),
    key(4, 14, 102, "Key: Right Shift"),
    key(4, 16, 104, "Key: Up Arrow"),
    key(4, 18, 106, "Key: Number Pad 1"),
    key(4, 19, 107, "Key: Number Pad 2"),
    key(4, 20, 108, "Key: Number Pad 3"),
    key(4, 21, 109, "Key: Number Pad Enter"),
    key(5, 0, 110, "Key: Left Control"),
    key(5, 1, 111, "Key: Left Windows"),
    key(5, 2, 112, "Key: Left Alt"),
    key(5, 4, 114, "Key: Left Space"),
    key(5, 6, 116, "Key: Space"),
    key(5, 8, 118, "Key: Right Space"),
    key(5, 10, 120, "Key: Right Alt"),
    key(5, 11, 121, "Key: Right Fn"),
    key(5, 12, 122, "Key: Menu"),
    key(5, 14, 124, "Key: Right Control"),
    key(5, 15, 125, "Key: Left Arrow"),
    key(5, 16, 126, "Key: Down Arrow"),
    key(5, 17, 127, "Key: Right Arrow"),
    key(5, 18, 128, "Key: Number Pad 0"),
    key(5, 20, 130, "Key: Number Pad ."),
];

pub const GK980_KEYS: &[Key] = &[
    key(0, 0, 0, "Key: Escape"),
    key(0, 3, 3, "Key: F1"),
    key(0, 4, 4, "Key: F2"),
    key(0, 5, 5, "Key: F3"),
    key(0, 6, 6, "Key: F4"),
    key(0, 7, 7, "Key: F5"),
    key(0, 8, 8, "Key: F6"),
    key(0, 9, 9, "Key: F7"),
    key(0, 10, 10, "Key: F8"),
    key(0, 11, 11, "Key: F9"),
    key(0, 12, 12, "Key: F10"),
    key(0, 13, 13, "Key: F11"),
    key(0, 14, 14, "Key: F12"),
    key(0, 15, 15, "Key: Delete"),
    key(0, 16, 16, "Key: Page Up"),
    key(0, 17, 17, "Key: Page Down"),
    key(0, 18, 18, "Key: Pause/Break"),
    key(0, 19, 19, "Key: Print Screen"),
    key(1, 0, 22, "Key: `"),
    key(1, 2, 24, "Key: 1"),
    key(1, 3, 25, "Key: 2"),
    key(1, 4, 26, "Key: 3"),
    key(1, 5, 27, "Key: 4"),
    key(1, 6, 28, "Key: 5"),
    key(1, 7, 29, "Key: 6"),
    key(1, 8, 30, "Key: 7"),
    key(1, 9, 31, "Key: 8"),
    key(1, 10, 32, "Key: 9"),
    key(1, 11, 33, "Key: 0"),
    key(1, 12, 34, "Key: -"),
    key(1, 13, 35, "Key: ="),
    key(1, 14, 36, "Key: Backspace"),
    key(1, 16, 38, "Key: Num Lock"),
    key(1, 17, 39, "Key: Number Pad /"),
    key(1, 18, 40, "Key: Number Pad *"),
    key(1, 19, 41, "Key: Number Pad -"),
    key(2, 0, 44, "Key: Tab"),
    key(2, 2, 46, "Key: Q"),
    key(2, 3, 47, "Key: W"),
    key(2, 4, 48, "Key: E"),
    key(2, 5, 49, "Key: R"),
    key(2, 6, 50, "Key: T"),
    key(2, 7, 51, "Key: Y"),
    key(2, 8, 52, "Key: U"),
    key(2, 9, 53, "Key: I"),
    key(2, 10, 54, "Key: O"),
    key(2, 11, 55, "Key: P"),
    key(2, 12, 56, "Key: ["),
    key(2, 13, 57, "Key: ]"),
    key(2, 14, 58, "Key: \\ (ANSI)"),
    key(2, 16, 60, "Key: Number Pad 7"),
    key(2, 17, 61, "Key: Number Pad 8"),
    key(2, 18, 62, "Key: Number Pad 9"),
    key(2, 19, 63, "Key: Number Pad +"),
    key(3, 0, 66, "Key: Caps Lock"),
    key(3, 2, 68, "Key: A"),
    key(3, 3, 69, "Key: S"),
    key(3, 4, 70, "Key: D"),
    key(3, 5, 71, "Key: F"),
    key(3, 6, 72, "Key: G"),
    key(3, 7, 73, "Key: H"),
    key(3, 8, 74, "Key: J"),
    key(3, 9, 75, "Key: K"),
    key(3, 10, 76, "Key: L"),
    key(3, 11, 77, "Key: ;"),
    key(3, 12, 78, "Key: '"),
    key(3, 14, 80, "Key: Enter"),
    key(3, 16, 82, "Key: Number Pad 4"),
    key(3, 17, 83, "Key: Number Pad 5"),
    key(3, 18, 84, "Key: Number Pad 6"),
    key(4, 0, 88, "Key: Left Shift"),
    key(4, 2, 90, "Key: Z"),
    key(4, 3, 91, "Key: X"),
    key(4, 4, 92, "Key: C"),
    key(4, 5, 93, "Key: V"),
    key(4, 6, 94, "Key: B"),
    key(4, 7, 95, "Key: N"),
    key(4, 8, 96, "Key: M"),
    key(4, 9, 97, "Key: ,"),
    key(4, 10, 98, "Key: ."),
    key(4, 11, 99, "Key: /"),
    key(4, 13, 101, "Key: Right Shift"),
    key(4, 15, 103, "Key: Up Arrow"),
    key(4, 16, 104, "Key: Number Pad 1"),
    key(4, 17, 105, "Key: Number Pad 2"),
    key(4, 18, 106, "Key: Number Pad 3"),
    key(4, 19, 107, "Key: Number Pad Enter"),
    key(5, 0, 110, "Key: Left Control"),
    key(5, 1, 111, "Key: Left Windows"),
    key(5, 2, 112, "Key: Left Alt"),
    key(5, 4, 114, "Key: Left Space"),
    key(5, 6, 116, "Key: Space"),
    key(5, 7, 116, "Key: Middle Space"),
    key(5, 8, 118, "Key: Right Space"),
    key(5, 10, 120, "Key: Right Alt"),
    key(5, 11, 121, "Key: Right Fn"),
    key(5, 12, 122, "Key: Right Control"),
    key(5, 14, 124, "Key: Left Arrow"),
    key(5, 15, 125, "Key: Down Arrow"),
    key(5, 16, 126, "Key: Right Arrow"),
    key(5, 17, 127, "Key: Number Pad 0"),
    key(5, 18, 128, "Key: Number Pad ."),
];

pub const GK61_KEYS: &[Key] = &[
    key(0, 0, 0, "Key: `"),
    key(0, 2, 2, "Key: 1"),
    key(0, 3, 3, "Key: 2"),
    key(0, 4, 4, "Key: 3"),
    key(0, 5, 5, "Key: 4"),
    key(0, 6, 6, "Key: 5"),
    key(0, 7, 7, "Key: 6"),
    key(0, 8, 8, "Key: 7"),
    key(0, 9, 9, "Key: 8"),
    key(0, 10, 10, "Key: 9"),
    key(0, 11, 11, "Key: 0"),
    key(0, 12, 12, "Key: -"),
    key(0, 13, 13, "Key: ="),
    key(0, 14, 14, "Key: Backspace"),
    key(1, 0, 22, "Key: Tab"),
    key(1, 2, 24, "Key: Q"),
    key(1, 3, 25, "Key: W"),
    key(1, 4, 26, "Key: E"),
    key(1, 5, 27, "Key: R"),
    key(1, 6, 28, "Key: T"),
    key(1, 7, 29, "Key: Y"),
    key(1, 8, 30, "Key: U"),
    key(1, 9, 31, "Key: I"),
    key(1, 10, 32, "Key: O"),
    key(1, 11, 33, "Key: P"),
    key(1, 12, 34, "Key: ["),
    key(1, 13, 35, "Key: ]"),
    key(1, 14, 36, "Key: \\ (ANSI)"),
    key(2, 0, 44, "Key: Caps Lock"),
    key(2, 2, 46, "Key: A"),
    key(2, 3, 47, "Key: S"),
    key(2, 4, 48, "Key: D"),
    key(2, 5, 49, "Key: F"),
    key(2, 6, 50, "Key: G"),
    key(2, 7, 51, "Key: H"),
    key(2, 8, 52, "Key: J"),
    key(2, 9, 53, "Key: K"),
    key(2, 10, 54, "Key: L"),
    key(2, 11, 55, "Key: ;"),
    key(2, 12, 56, "Key: '"),
    key(2, 14, 58, "Key: Enter"),
    key(3, 0, 66, "Key: Left Shift"),
    key(3, 2, 68, "Key: Z"),
    key(3, 3, 69, "Key: X"),
    key(3, 4, 70, "Key: C"),
    key(3, 5, 71, "Key: V"),
    key(3, 6, 72, "Key: B"),
    key(3, 7, 73, "Key: N"),
    key(3, 8, 74, "Key: M"),
    key(3, 9, 75, "Key: ,"),
    key(3, 10, 76, "Key: ."),
    key(3, 11, 77, "Key: /"),
    key(3, 14, 80, "Key: Right Shift"),
    key(4, 0, 88, "Key: Left Control"),
    key(4, 1, 89, "Key: Left Windows"),
    key(4, 2, 90, "Key: Left Alt"),
    key(4, 4, 92, "Key: Left Space"),
    key(4, 7, 95, "Key: Space"),
    key(4, 9, 97, "Key: Right Space"),
    key(4, 10, 98, "Key: Right Alt"),
    key(4, 11, 99, "Key: Menu"),
    key(4, 13, 101, "Key: Right Control"),
    key(4, 14, 102, "Key: Right Fn"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::LED_COUNT;

    #[test]
    fn finds_known_models() {
        let model = find_model(656802051).unwrap();
        assert_eq!(model.name, "Skyloong GK104 Pro");
        assert_eq!(model.keys.len(), 107);

        assert_eq!(find_model(656802008).unwrap().keys.len(), 102);
        assert_eq!(find_model(656802031).unwrap().name, "Skyloong GK61");
        assert_eq!(
            find_model(656802032).unwrap().keys,
            find_model(656802031).unwrap().keys
        );
        assert!(find_model(0).is_none());
        assert!(find_model(656802050).is_none());
    }

    #[test]
    fn parses_model_id_from_response() {
        let mut response = [0u8; 64];
        response[8..12].copy_from_slice(&656802051u32.to_le_bytes());
        assert_eq!(parse_model_id(&response).unwrap(), 656802051);

        assert!(matches!(
            parse_model_id(&response[..11]),
            Err(BoardError::ShortRead { read: 11, expected: 12 })
        ));
    }

    #[test]
    fn layouts_fit_matrix_and_image() {
        for model in MODELS {
            for key in model.keys {
                assert!((key.row as usize) < MATRIX_HEIGHT, "{}", key.name);
                assert!((key.col as usize) < MATRIX_WIDTH, "{}", key.name);
                assert!((key.led as usize) < LED_COUNT, "{}", key.name);
            }
        }
    }

    #[test]
    fn matrix_cells_point_back_to_keys() {
        let model = find_model(656802051).unwrap();
        let map = model.matrix();
        assert_eq!(map.cells.iter().flatten().count(), model.keys.len());
        let escape = map.get(0, 0).unwrap();
        assert_eq!(model.keys[escape].name, "Key: Escape");
        assert_eq!(map.get(0, 1), None);
    }
}
