//! Stable avatar colors for staff names
//!
//! The hash matches the one used by the web client so a given name
//! keeps the same color everywhere it is shown.

/// Background/foreground pair for one avatar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvatarColor {
    pub background: &'static str,
    pub foreground: &'static str,
}

const PALETTE: [AvatarColor; 8] = [
    AvatarColor { background: "#e0f2fe", foreground: "#0369a1" }, // sky
    AvatarColor { background: "#dcfce7", foreground: "#15803d" }, // green
    AvatarColor { background: "#fef9c3", foreground: "#a16207" }, // yellow
    AvatarColor { background: "#fee2e2", foreground: "#b91c1c" }, // red
    AvatarColor { background: "#f3e8ff", foreground: "#7e22ce" }, // purple
    AvatarColor { background: "#ffedd5", foreground: "#c2410c" }, // orange
    AvatarColor { background: "#fce7f3", foreground: "#be185d" }, // pink
    AvatarColor { background: "#ccfbf1", foreground: "#0f766e" }, // teal
];

/// Palette slot for `name`; empty names use slot 0
pub fn palette_index(name: &str) -> usize {
    let mut hash: i64 = 0;
    for unit in name.encode_utf16() {
        // The shift runs on the low 32 bits; the subtraction does not
        let shifted = (hash as i32).wrapping_shl(5) as i64;
        hash = (unit as i64).wrapping_add(shifted.wrapping_sub(hash));
    }
    (hash.unsigned_abs() % PALETTE.len() as u64) as usize
}

/// Avatar colors for a display name
pub fn color_for(name: &str) -> AvatarColor {
    PALETTE[palette_index(name)]
}

/// First character of the name, for the avatar circle
pub fn initial(name: &str) -> String {
    name.chars().next().map(String::from).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_indices() {
        // "Ana": ((65 * 31) + 110) * 31 + 97 = 65972 -> 65972 % 8 = 4
        assert_eq!(palette_index("Ana"), 4);
        assert_eq!(color_for("Ana").background, "#f3e8ff");
        // "Bea": 66654 % 8 = 6
        assert_eq!(palette_index("Bea"), 6);
    }

    #[test]
    fn test_empty_name_uses_first_slot() {
        assert_eq!(palette_index(""), 0);
        assert_eq!(color_for(""), PALETTE[0]);
    }

    #[test]
    fn test_stable_for_long_names() {
        let name = "Maria Fernanda de la Cruz Villanueva-Santos";
        let first = palette_index(name);
        for _ in 0..10 {
            assert_eq!(palette_index(name), first);
        }
        assert!(first < PALETTE.len());
    }

    #[test]
    fn test_initial() {
        assert_eq!(initial("ana"), "a");
        assert_eq!(initial(""), "");
    }
}
