use crate::models::openf1::MeetingRecord;

/// Lowercases, expands "GP" and drops punctuation so that "british gp",
/// "British Grand Prix" and "BRITISH GRAND PRIX" compare equal.
pub fn normalize_gp_name(name: &str) -> String {
    name.split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let word: String = word
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            if word == "gp" {
                "grand prix".to_string()
            } else {
                word
            }
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Finds the meeting a user means. An exact name match wins, then the
/// official name, country, location and circuit, then a "<query> grand prix"
/// match so that "Great Britain" or "Silverstone" resolve too.
pub fn find_meeting<'a>(query: &str, meetings: &'a [MeetingRecord]) -> Option<&'a MeetingRecord> {
    let wanted = normalize_gp_name(query);
    if wanted.is_empty() {
        return None;
    }
    let with_suffix = format!("{wanted} grand prix");

    let matches = |value: Option<&str>| {
        value.map(normalize_gp_name).as_deref() == Some(wanted.as_str())
    };

    meetings
        .iter()
        .find(|m| matches(Some(m.meeting_name.as_str())))
        .or_else(|| {
            meetings.iter().find(|m| {
                matches(m.meeting_official_name.as_deref())
                    || matches(m.country_name.as_deref())
                    || matches(m.location.as_deref())
                    || matches(m.circuit_short_name.as_deref())
            })
        })
        .or_else(|| {
            meetings
                .iter()
                .find(|m| normalize_gp_name(&m.meeting_name) == with_suffix)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meeting(name: &str, country: &str, location: &str, circuit: &str) -> MeetingRecord {
        MeetingRecord {
            meeting_key: 1,
            meeting_name: name.into(),
            meeting_official_name: None,
            location: Some(location.into()),
            country_name: Some(country.into()),
            circuit_short_name: Some(circuit.into()),
            date_start: None,
            year: 2024,
        }
    }

    fn calendar() -> Vec<MeetingRecord> {
        vec![
            meeting("Austrian Grand Prix", "Austria", "Spielberg", "Spielberg"),
            meeting("British Grand Prix", "United Kingdom", "Silverstone", "Silverstone"),
            meeting("Hungarian Grand Prix", "Hungary", "Budapest", "Hungaroring"),
        ]
    }

    #[test]
    fn normalizes_abbreviations_and_case() {
        assert_eq!(normalize_gp_name("  British GP "), "british grand prix");
        assert_eq!(normalize_gp_name("São Paulo Grand Prix"), "são paulo grand prix");
        assert_eq!(normalize_gp_name("Emilia-Romagna"), "emilia romagna");
    }

    #[test]
    fn resolves_by_name_country_or_circuit() {
        let meetings = calendar();
        let name = |q: &str| find_meeting(q, &meetings).map(|m| m.meeting_name.as_str());
        assert_eq!(name("british gp"), Some("British Grand Prix"));
        assert_eq!(name("Silverstone"), Some("British Grand Prix"));
        assert_eq!(name("Hungary"), Some("Hungarian Grand Prix"));
        assert_eq!(name("British"), Some("British Grand Prix"));
        assert_eq!(name("Monaco Grand Prix"), None);
        assert_eq!(name("   "), None);
    }
}
