//! Import of Truncated-Julian-Day GTI lists.
//!
//! Each non-comment line holds a `start_tjd stop_tjd` pair. Times are
//! converted to MET with the caller's [`MissionEpoch`] and inserted into an
//! [`IntervalSet`], so overlapping or touching windows merge.

use std::fs;
use std::path::Path;

use crate::domain::MissionEpoch;
use crate::error::AppError;
use crate::gti::IntervalSet;

pub fn read_tjd_gti(path: &Path, epoch: &MissionEpoch) -> Result<IntervalSet, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::new(2, format!("Failed to read TJD GTI list '{}': {e}", path.display())))?;
    parse_tjd_gti(&text, epoch)
}

pub fn parse_tjd_gti(text: &str, epoch: &MissionEpoch) -> Result<IntervalSet, AppError> {
    let mut set = IntervalSet::new();
    let mut pairs = 0usize;

    for (lineno, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let values = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<f64>().map_err(|_| {
                    AppError::new(2, format!("TJD GTI line {}: '{s}' is not a number.", lineno + 1))
                })
            })
            .collect::<Result<Vec<f64>, AppError>>()?;

        let [start, stop] = values[..] else {
            return Err(AppError::new(
                2,
                format!("TJD GTI line {}: expected `start stop`, got {} value(s).", lineno + 1, values.len()),
            ));
        };

        set.insert_interval(epoch.met_from_tjd(start), epoch.met_from_tjd(stop))
            .map_err(|e| AppError::new(e.exit_code(), format!("TJD GTI line {}: {e}", lineno + 1)))?;
        pairs += 1;
    }

    log::debug!("read {pairs} TJD pairs into {} intervals", set.len());
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_convert_and_merge() {
        let epoch = MissionEpoch::new(48361.0);
        let text = "# TJD windows\n8361.0 8361.5\n8361.5, 8362.0\n8363 8364 # late\n";
        let set = parse_tjd_gti(text, &epoch).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.min_value().unwrap(), 0.0);
        assert_eq!(set.intervals()[0].stop, 86_400.0);
        assert!(set.accept(2.0 * 86_400.0));
        assert!(!set.accept(1.5 * 86_400.0));
    }

    #[test]
    fn malformed_lines_name_the_line() {
        let epoch = MissionEpoch::default();
        let err = parse_tjd_gti("1 2\n3\n", &epoch).unwrap_err();
        assert!(err.message().contains("line 2"));

        let err = parse_tjd_gti("5 4\n", &epoch).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("line 1"));
    }
}
