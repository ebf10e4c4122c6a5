/// Components of a recording file name `<prefix>-<speaker>-<number>-<label>`.
///
/// The label component keeps whatever follows the third dash up to the next
/// dash, including the `.csv` extension (e.g. `"1.csv"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingName {
    pub prefix: String,
    pub speaker: String,
    pub number: String,
    pub label: String,
}

impl RecordingName {
    /// Splits a file name on `-`. Returns `None` with fewer than four parts.
    pub fn parse(file_name: &str) -> Option<Self> {
        let parts: Vec<&str> = file_name.split('-').collect();
        if parts.len() < 4 {
            return None;
        }
        Some(Self {
            prefix: parts[0].to_string(),
            speaker: parts[1].to_string(),
            number: parts[2].to_string(),
            label: parts[3].to_string(),
        })
    }

    /// File name of the sibling recording under another prefix.
    pub fn sibling(&self, prefix: &str) -> String {
        format!("{}-{}-{}-{}", prefix, self.speaker, self.number, self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_components() {
        let name = RecordingName::parse("audio-caitlyn-3-1.csv").unwrap();
        assert_eq!(name.prefix, "audio");
        assert_eq!(name.speaker, "caitlyn");
        assert_eq!(name.number, "3");
        assert_eq!(name.label, "1.csv");
        assert_eq!(name.sibling("ppg"), "ppg-caitlyn-3-1.csv");
    }

    #[test]
    fn parse_rejects_short_names() {
        assert!(RecordingName::parse("audio-caitlyn-3.csv").is_none());
        assert!(RecordingName::parse("audio.csv").is_none());
    }
}
