use std::io::BufRead;

use crate::descriptor::LfsrDescriptor;
use crate::error::{Error, Result};

/// An ordered collection of [`LfsrDescriptor`]s, used as the search space by
/// the [`Correlator`](crate::Correlator).
///
/// Immutable once loaded; iteration order matches the order polynomials
/// appeared in the source file, and that order is what the correlator uses
/// as its search order.
pub struct PolyLibrary {
    descriptors: Vec<LfsrDescriptor>,
}

impl PolyLibrary {
    /// Parse a polynomial database from any `BufRead` source (the caller
    /// owns opening the underlying file).
    ///
    /// Grammar: `#`-prefixed lines are comments. Blank lines reset the
    /// `primitive` flag to true. A line containing the substring
    /// `non-primitive` turns the flag off for subsequent non-blank,
    /// non-comment lines. Any other line, while `primitive` is true, is a
    /// CSV list of unsigned tap exponents.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut primitive = true;
        let mut descriptors = Vec::new();

        for line in reader.lines() {
            let line = line.map_err(|source| Error::Io {
                path: "<polynomial database>".into(),
                source,
            })?;
            let trimmed = line.trim();

            if trimmed.is_empty() {
                primitive = true;
                continue;
            }

            if trimmed.contains("non-primitive") {
                primitive = false;
                continue;
            }

            if !trimmed.starts_with('#') && primitive {
                let taps = Self::parse_taps(trimmed)?;
                descriptors.push(LfsrDescriptor::new(&taps)?);
            }
        }

        Ok(PolyLibrary { descriptors })
    }

    fn parse_taps(line: &str) -> Result<Vec<u32>> {
        line.split(',')
            .map(|field| {
                field
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| Error::MalformedPolyLine { line: line.to_string() })
            })
            .collect()
    }

    /// Descriptors in file order.
    pub fn descriptors(&self) -> &[LfsrDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn skips_comments_and_blank_lines() {
        let text = "# header comment\n\n7,6,1\n\n5,2,1\n";
        let lib = PolyLibrary::parse(Cursor::new(text)).unwrap();
        assert_eq!(lib.len(), 2);
        assert_eq!(lib.descriptors()[0].poly_string(), "x^7 + x^6 + 1");
        assert_eq!(lib.descriptors()[1].poly_string(), "x^5 + x^2 + x^1 + 1");
    }

    #[test]
    fn non_primitive_block_is_skipped_until_blank_line() {
        let text = "7,6,1\nnon-primitive\n9,4,1\n10,3,2\n\n5,2,1\n";
        let lib = PolyLibrary::parse(Cursor::new(text)).unwrap();
        // 7,6,1 before the marker and 5,2,1 after the next blank line are
        // kept; the two lines in between are skipped as non-primitive.
        assert_eq!(lib.len(), 2);
        assert_eq!(lib.descriptors()[0].poly_string(), "x^7 + x^6 + 1");
        assert_eq!(lib.descriptors()[1].poly_string(), "x^5 + x^2 + x^1 + 1");
    }

    #[test]
    fn preserves_file_order() {
        let text = "10,3,1\n7,6,1\n15,1\n";
        let lib = PolyLibrary::parse(Cursor::new(text)).unwrap();
        let polys: Vec<_> = lib.descriptors().iter().map(|d| d.poly_string()).collect();
        assert_eq!(
            polys,
            vec!["x^10 + x^3 + x^1 + 1", "x^7 + x^6 + 1", "x^15 + 1"]
        );
    }

    #[test]
    fn rejects_malformed_line() {
        let text = "7,six,1\n";
        let err = PolyLibrary::parse(Cursor::new(text)).unwrap_err();
        assert!(matches!(err, Error::MalformedPolyLine { .. }));
    }
}
