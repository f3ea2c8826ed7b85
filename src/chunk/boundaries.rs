//! Break point detection for chunking

/// Priority levels for break points
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BreakPriority {
    /// Word boundary (lowest)
    Word = 1,
    /// Sentence boundary
    Sentence = 2,
    /// Paragraph boundary (highest)
    Paragraph = 3,
}

/// A potential break point in text
#[derive(Debug, Clone)]
pub struct BreakPoint {
    /// Byte position
    pub position: usize,
    /// Priority of this break point
    pub priority: BreakPriority,
}

/// Find potential break points in the text, sorted by position
pub fn find_break_points(text: &str) -> Vec<BreakPoint> {
    let mut points = Vec::new();

    // Paragraph breaks (blank lines)
    for (i, _) in text.match_indices("\n\n") {
        let pos = i + 2;
        if text.is_char_boundary(pos) {
            points.push(BreakPoint {
                position: pos,
                priority: BreakPriority::Paragraph,
            });
        }
    }

    // Sentence boundaries
    for pattern in [". ", ".\n", "? ", "! "] {
        for (i, _) in text.match_indices(pattern) {
            let pos = i + 2;
            if text.is_char_boundary(pos) {
                points.push(BreakPoint {
                    position: pos,
                    priority: BreakPriority::Sentence,
                });
            }
        }
    }

    // Word boundaries
    for (i, _) in text.match_indices(' ') {
        let pos = i + 1;
        if text.is_char_boundary(pos) {
            points.push(BreakPoint {
                position: pos,
                priority: BreakPriority::Word,
            });
        }
    }

    points.sort_by_key(|p| p.position);
    // Keep the highest-priority break at each position
    points.dedup_by(|a, b| {
        if a.position == b.position {
            if a.priority > b.priority {
                b.priority = a.priority;
            }
            true
        } else {
            false
        }
    });

    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_break_priority_ordering() {
        assert!(BreakPriority::Paragraph > BreakPriority::Sentence);
        assert!(BreakPriority::Sentence > BreakPriority::Word);
    }

    #[test]
    fn test_find_break_points() {
        let text = "First sentence. Second one.\n\nNew paragraph here";
        let points = find_break_points(text);

        assert!(points
            .iter()
            .any(|p| p.priority == BreakPriority::Paragraph));
        assert!(points.iter().any(|p| p.priority == BreakPriority::Sentence));
        assert!(points.iter().any(|p| p.priority == BreakPriority::Word));

        // Sorted by position
        for pair in points.windows(2) {
            assert!(pair[0].position <= pair[1].position);
        }
    }
}
