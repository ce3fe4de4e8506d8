use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::FontArc;
use thiserror::Error;
use tracing::debug;

use super::style::{FontDescriptor, normalize_family};

#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to read font {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid font data registered for family '{family}'")]
    Invalid { family: String },
}

/// Weight/slant combination a face was designed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FaceStyle {
    pub bold: bool,
    pub italic: bool,
}

impl FaceStyle {
    pub const REGULAR: Self = Self {
        bold: false,
        italic: false,
    };
    pub const BOLD: Self = Self {
        bold: true,
        italic: false,
    };
    pub const ITALIC: Self = Self {
        bold: false,
        italic: true,
    };
    pub const BOLD_ITALIC: Self = Self {
        bold: true,
        italic: true,
    };

    /// Preference score of a face with this style for `wanted`.
    /// Missing attributes can be synthesized, extra ones cannot be removed.
    fn score(self, wanted: FaceStyle) -> i32 {
        let attr = |have: bool, want: bool| match (have, want) {
            (true, true) => 2,
            (false, false) => 1,
            (false, true) => 0,
            (true, false) => -2,
        };
        attr(self.bold, wanted.bold) + attr(self.italic, wanted.italic)
    }
}

#[derive(Clone)]
struct Face {
    family: String,
    style: FaceStyle,
    font: FontArc,
}

/// Font faces available to the renderer, keyed by family and style.
#[derive(Clone, Default)]
pub struct FontBook {
    faces: Vec<Face>,
}

/// A face picked for a [`FontDescriptor`], plus what has to be faked.
#[derive(Clone, Copy)]
pub struct ResolvedFace<'a> {
    pub family: &'a str,
    pub font: &'a FontArc,
    pub synthetic_bold: bool,
    pub synthetic_italic: bool,
}

impl FontBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a TrueType/OpenType face. Re-registering the same family
    /// and style replaces the previous face.
    pub fn register(
        &mut self,
        family: &str,
        style: FaceStyle,
        data: Vec<u8>,
    ) -> Result<(), FontError> {
        let family = normalize_family(family).to_string();
        let font = FontArc::try_from_vec(data).map_err(|_| FontError::Invalid {
            family: family.clone(),
        })?;
        debug!(%family, ?style, "registered font face");
        let face = Face {
            family,
            style,
            font,
        };
        let existing = self
            .faces
            .iter()
            .position(|f| f.family.eq_ignore_ascii_case(&face.family) && f.style == face.style);
        match existing {
            Some(idx) => self.faces[idx] = face,
            None => self.faces.push(face),
        }
        Ok(())
    }

    pub fn register_file(
        &mut self,
        family: &str,
        style: FaceStyle,
        path: &Path,
    ) -> Result<(), FontError> {
        let data = fs::read(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.register(family, style, data)
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Distinct registered family names, in registration order.
    pub fn families(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for face in &self.faces {
            if !names.iter().any(|n| n.eq_ignore_ascii_case(&face.family)) {
                names.push(&face.family);
            }
        }
        names
    }

    /// Pick a face for `descriptor`.
    ///
    /// The first listed family that is registered wins. When none is, the
    /// family of the first registered face stands in. Returns `None` only
    /// for an empty book.
    pub fn resolve(&self, descriptor: &FontDescriptor) -> Option<ResolvedFace<'_>> {
        self.resolve_chain(descriptor).into_iter().next()
    }

    /// Faces to consult per glyph, most preferred first: the listed
    /// families in order, then every other registered family in
    /// registration order. Each family contributes its best-matching face.
    pub(crate) fn resolve_chain(&self, descriptor: &FontDescriptor) -> Vec<ResolvedFace<'_>> {
        let wanted = FaceStyle {
            bold: descriptor.bold,
            italic: descriptor.italic,
        };
        let mut chain: Vec<&Face> = Vec::new();
        for family in descriptor.families() {
            if let Some(face) = self.best_in_family(family, wanted) {
                push_unique(&mut chain, face);
            }
        }
        if chain.is_empty() && !self.faces.is_empty() {
            debug!(
                requested = %descriptor.family,
                used = %self.faces[0].family,
                "no requested font family registered; using default"
            );
        }
        for family in self.families() {
            if let Some(face) = self.best_in_family(family, wanted) {
                push_unique(&mut chain, face);
            }
        }
        chain.into_iter().map(|face| face.resolved(wanted)).collect()
    }

    fn best_in_family(&self, family: &str, wanted: FaceStyle) -> Option<&Face> {
        let mut best: Option<&Face> = None;
        for face in self
            .faces
            .iter()
            .filter(|f| f.family.eq_ignore_ascii_case(family))
        {
            if best.is_none_or(|b| face.style.score(wanted) > b.style.score(wanted)) {
                best = Some(face);
            }
        }
        best
    }
}

fn push_unique<'a>(chain: &mut Vec<&'a Face>, face: &'a Face) {
    if !chain.iter().any(|picked| std::ptr::eq(*picked, face)) {
        chain.push(face);
    }
}

impl Face {
    fn resolved(&self, wanted: FaceStyle) -> ResolvedFace<'_> {
        ResolvedFace {
            family: &self.family,
            font: &self.font,
            synthetic_bold: wanted.bold && !self.style.bold,
            synthetic_italic: wanted.italic && !self.style.italic,
        }
    }
}

impl fmt::Debug for FontBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.faces.iter().map(|face| (&face.family, face.style)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEJAVU: &[u8] = include_bytes!("../../tests/fixtures/DejaVuSans.ttf");

    fn descriptor(family: &str, bold: bool, italic: bool) -> FontDescriptor {
        FontDescriptor {
            italic,
            bold,
            size_px: 20.0,
            family: family.to_string(),
        }
    }

    #[test]
    fn empty_book_resolves_nothing() {
        let book = FontBook::new();
        assert!(book.is_empty());
        assert!(book.resolve(&descriptor("Arial", false, false)).is_none());
    }

    #[test]
    fn invalid_data_is_rejected() {
        let mut book = FontBook::new();
        let err = book
            .register("Broken", FaceStyle::REGULAR, b"not a font".to_vec())
            .unwrap_err();
        assert!(matches!(err, FontError::Invalid { .. }));
        assert!(book.is_empty());
    }

    #[test]
    fn first_listed_registered_family_wins() {
        let mut book = FontBook::new();
        book.register("Fallback", FaceStyle::REGULAR, DEJAVU.to_vec())
            .unwrap();
        book.register("'Serif Face'", FaceStyle::REGULAR, DEJAVU.to_vec())
            .unwrap();

        let face = book
            .resolve(&descriptor("Missing, serif face, Fallback", false, false))
            .unwrap();
        assert_eq!(face.family, "Serif Face");

        let face = book.resolve(&descriptor("Missing", false, false)).unwrap();
        assert_eq!(face.family, "Fallback");
        assert_eq!(book.families(), vec!["Fallback", "Serif Face"]);
    }

    #[test]
    fn chain_lists_requested_families_then_the_rest() {
        let mut book = FontBook::new();
        for family in ["Fallback", "Serif Face", "Mono"] {
            book.register(family, FaceStyle::REGULAR, DEJAVU.to_vec())
                .unwrap();
        }
        book.register("Mono", FaceStyle::BOLD, DEJAVU.to_vec())
            .unwrap();

        let chain = book.resolve_chain(&descriptor("Mono, Missing, serif face", true, false));
        let families: Vec<&str> = chain.iter().map(|face| face.family).collect();
        assert_eq!(families, vec!["Mono", "Serif Face", "Fallback"]);
        assert!(!chain[0].synthetic_bold);
        assert!(chain[1].synthetic_bold);

        let chain = book.resolve_chain(&descriptor("Missing", false, false));
        let families: Vec<&str> = chain.iter().map(|face| face.family).collect();
        assert_eq!(families, vec!["Fallback", "Serif Face", "Mono"]);
        assert!(FontBook::new().resolve_chain(&descriptor("Mono", false, false)).is_empty());
    }

    #[test]
    fn styles_are_matched_or_synthesized() {
        let mut book = FontBook::new();
        book.register("Sans", FaceStyle::REGULAR, DEJAVU.to_vec())
            .unwrap();
        book.register("Sans", FaceStyle::BOLD, DEJAVU.to_vec())
            .unwrap();

        let face = book.resolve(&descriptor("Sans", true, false)).unwrap();
        assert!(!face.synthetic_bold);
        assert!(!face.synthetic_italic);

        let face = book.resolve(&descriptor("Sans", true, true)).unwrap();
        assert!(!face.synthetic_bold);
        assert!(face.synthetic_italic);

        let face = book.resolve(&descriptor("Sans", false, true)).unwrap();
        assert!(!face.synthetic_bold);
        assert!(face.synthetic_italic);
    }

    #[test]
    fn bold_only_family_is_still_usable_for_regular_text() {
        let mut book = FontBook::new();
        book.register("Heavy", FaceStyle::BOLD, DEJAVU.to_vec())
            .unwrap();
        let face = book.resolve(&descriptor("Heavy", false, false)).unwrap();
        assert_eq!(face.family, "Heavy");
        assert!(!face.synthetic_bold);
    }
}
