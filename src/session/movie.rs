//! Movie (frame to state) descriptor.

use std::collections::BTreeSet;

use crate::pickle::Value;

/// Frame sequence stored in the session's `movie` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieDescriptor {
    /// Number of frames.
    pub frame_count: usize,
    /// State index shown at each frame.
    pub frames: Vec<usize>,
    /// Command text attached to each frame (may be empty).
    pub commands: Vec<String>,
    /// Zero-based frame the session was saved at.
    pub current_frame: usize,
}

impl MovieDescriptor {
    /// Decode `[frame_count, _, _, _, frames, commands, ...]`. Returns
    /// `None` when the session has no frames.
    #[must_use]
    pub fn from_value(movie: &Value) -> Option<Self> {
        let frame_count = usize::try_from(movie.int_at(0)?).ok()?;
        if frame_count == 0 {
            return None;
        }
        let mut frames: Vec<usize> = movie
            .seq_at(4)
            .unwrap_or_default()
            .iter()
            .filter_map(Value::as_int)
            .filter_map(|s| usize::try_from(s).ok())
            .collect();
        if frames.is_empty() {
            frames = (0..frame_count).collect();
        }
        let commands = movie
            .seq_at(5)
            .unwrap_or_default()
            .iter()
            .map(|v| v.as_text().unwrap_or_default().to_owned())
            .collect();
        Some(Self {
            frame_count,
            frames,
            commands,
            current_frame: 0,
        })
    }

    /// States referenced by at least one frame.
    #[must_use]
    pub fn referenced_states(&self) -> BTreeSet<usize> {
        self.frames.iter().copied().collect()
    }

    /// Frames that carry a non-blank command.
    pub fn scripted_frames(&self) -> impl Iterator<Item = (usize, &str)> {
        self.commands
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.trim().is_empty())
            .map(|(i, c)| (i, c.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(v: &[i32]) -> Value {
        Value::Sequence(v.iter().map(|&i| Value::Int(i)).collect())
    }

    #[test]
    fn decodes_frames_and_commands() {
        let movie = Value::Sequence(vec![
            Value::Int(4),
            Value::None,
            Value::None,
            Value::None,
            ints(&[0, 2, 2, 0]),
            Value::Sequence(vec![
                Value::Text(String::new()),
                Value::Text("turn y, 10".to_owned()),
            ]),
        ]);
        let m = MovieDescriptor::from_value(&movie).unwrap();
        assert_eq!(m.frame_count, 4);
        assert_eq!(m.referenced_states().into_iter().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(m.scripted_frames().collect::<Vec<_>>(), vec![(1, "turn y, 10")]);
    }

    #[test]
    fn empty_movie_is_none() {
        let movie = Value::Sequence(vec![Value::Int(0)]);
        assert!(MovieDescriptor::from_value(&movie).is_none());
    }

    #[test]
    fn missing_frame_list_means_identity() {
        let m = MovieDescriptor::from_value(&Value::Sequence(vec![Value::Int(3)])).unwrap();
        assert_eq!(m.frames, vec![0, 1, 2]);
    }
}
