//! CLI-specific utilities for baryscore
//!
//! Participant argument parsing and result rendering, kept separate from the
//! core library functionality.

pub mod progress;

pub use progress::ProgressManager;

use std::fmt::Write as _;

use baryscore::{google_search_url, osm_node_url, Coordinate, Error, MeetingPlan, Participant, Result, TravelMode};

/// `NAME=LAT,LON[,MODE]`
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedArg {
    pub name: String,
    pub location: Coordinate,
    pub mode: Option<TravelMode>,
}

/// `NAME=ADDRESS[,MODE]`
#[derive(Debug, Clone, PartialEq)]
pub struct AddressArg {
    pub name: String,
    pub address: String,
    pub mode: Option<TravelMode>,
}

fn split_name<'a>(spec: &'a str, expected: &str) -> Result<(&'a str, &'a str)> {
    match spec.split_once('=') {
        Some((name, rest)) if !name.trim().is_empty() && !rest.trim().is_empty() => {
            Ok((name.trim(), rest.trim()))
        }
        _ => Err(Error::InvalidInput(format!("'{spec}' is not of the form {expected}"))),
    }
}

pub fn parse_located(spec: &str) -> Result<LocatedArg> {
    const FORM: &str = "NAME=LAT,LON[,MODE]";
    let (name, rest) = split_name(spec, FORM)?;
    let parts: Vec<&str> = rest.split(',').map(str::trim).collect();
    let (lat, lon, mode) = match parts.as_slice() {
        [lat, lon] => (*lat, *lon, None),
        [lat, lon, mode] => (*lat, *lon, Some(mode.parse::<TravelMode>()?)),
        _ => return Err(Error::InvalidInput(format!("'{spec}' is not of the form {FORM}"))),
    };
    let parse = |value: &str| {
        value
            .parse::<f64>()
            .map_err(|_| Error::InvalidInput(format!("'{value}' is not a valid coordinate in '{spec}'")))
    };
    Ok(LocatedArg {
        name: name.to_string(),
        location: Coordinate::from_lat_lon(parse(lat)?, parse(lon)?),
        mode,
    })
}

/// The trailing `,MODE` is only split off when it names a travel mode,
/// addresses themselves usually contain commas
pub fn parse_address(spec: &str) -> Result<AddressArg> {
    let (name, rest) = split_name(spec, "NAME=ADDRESS[,MODE]")?;
    let (address, mode) = match rest.rsplit_once(',') {
        Some((address, tail)) => match tail.parse::<TravelMode>() {
            Ok(mode) => (address.trim(), Some(mode)),
            Err(_) => (rest, None),
        },
        None => (rest, None),
    };
    Ok(AddressArg {
        name: name.to_string(),
        address: address.to_string(),
        mode,
    })
}

fn format_deviation(note: f64) -> String {
    if note > 0.0 {
        format!("+{note:.0} min")
    } else {
        format!("{note:.0} min")
    }
}

/// Human-readable ranking, best venue first
pub fn render_plan(plan: &MeetingPlan, participants: &[Participant], limit: usize) -> String {
    let mut out = String::new();
    if plan.venues.is_empty() {
        out.push_str("No venue found in this area\n");
        return out;
    }

    for (rank, scored) in plan.venues.iter().take(limit).enumerate() {
        let venue = &scored.venue;
        let _ = writeln!(out, "{}. {}  {:.0}/100", rank + 1, venue.display_name(), scored.score);
        if let Some(address) = venue.address.as_deref() {
            let _ = writeln!(out, "   {address}");
        }
        for (i, participant) in participants.iter().enumerate() {
            let (Some(note), Some(duration)) = (scored.participant_notes.get(i), scored.durations.get(i)) else {
                continue;
            };
            let _ = writeln!(
                out,
                "   {:<16} {:>8}  {:>4.0} min ({})",
                participant.name,
                format_deviation(*note),
                duration,
                participant.mode
            );
        }
        let _ = writeln!(out, "   {}", google_search_url(venue));
        if let Some(link) = osm_node_url(venue) {
            let _ = writeln!(out, "   {link}");
        }
    }

    if plan.venues.len() > limit {
        let _ = writeln!(out, "... {} more (use --limit)", plan.venues.len() - limit);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use baryscore::{ScoredVenue, Venue};

    #[test]
    fn test_parse_located() {
        let arg = parse_located("Alice=48.85,2.35").unwrap();
        assert_eq!(arg.name, "Alice");
        assert_eq!(arg.location, Coordinate::from_lat_lon(48.85, 2.35));
        assert_eq!(arg.mode, None);

        let arg = parse_located("Bob = 48.86, 2.36, bike").unwrap();
        assert_eq!(arg.name, "Bob");
        assert_eq!(arg.mode, Some(TravelMode::Cycling));
    }

    #[test]
    fn test_parse_located_errors() {
        assert!(parse_located("48.85,2.35").is_err());
        assert!(parse_located("Alice=48.85").is_err());
        assert!(parse_located("Alice=north,2.35").is_err());
        let err = parse_located("Alice=48.85,2.35,walkin").unwrap_err();
        assert!(err.to_string().contains("Did you mean 'walking'"), "{err}");
    }

    #[test]
    fn test_parse_address_keeps_commas() {
        let arg = parse_address("Carol=10 Rue de Rivoli, Paris").unwrap();
        assert_eq!(arg.address, "10 Rue de Rivoli, Paris");
        assert_eq!(arg.mode, None);

        let arg = parse_address("Carol=10 Rue de Rivoli, Paris, walking").unwrap();
        assert_eq!(arg.address, "10 Rue de Rivoli, Paris");
        assert_eq!(arg.mode, Some(TravelMode::Walking));
    }

    fn plan() -> (MeetingPlan, Vec<Participant>) {
        let participants = vec![
            Participant {
                id: 1,
                name: "Alice".to_string(),
                address: String::new(),
                location: Coordinate::from_lat_lon(48.85, 2.35),
                mode: TravelMode::Walking,
            },
            Participant {
                id: 2,
                name: "Bob".to_string(),
                address: String::new(),
                location: Coordinate::from_lat_lon(48.86, 2.36),
                mode: TravelMode::Driving,
            },
        ];
        let venue = Venue {
            id: 1,
            osm_id: Some(42),
            name: Some("Chez Paul".to_string()),
            location: Coordinate::from_lat_lon(48.855, 2.355),
            address: Some("2 Rue Oberkampf".to_string()),
            website: None,
            phone: None,
            opening_hours: None,
            amenity: Some("bar".to_string()),
        };
        let scored = ScoredVenue {
            venue,
            score: 80.4,
            avg_duration_min: 6.0,
            max_duration_min: 10.0,
            durations: vec![10.0, 2.0],
            participant_notes: vec![4.0, -4.0],
            routes: Vec::new(),
        };
        let plan = MeetingPlan {
            center: Coordinate::from_lat_lon(48.855, 2.355),
            radius_m: 3000.0,
            venues: vec![scored.clone(), scored],
        };
        (plan, participants)
    }

    #[test]
    fn test_render_plan() {
        let (plan, participants) = plan();
        let text = render_plan(&plan, &participants, 1);

        assert!(text.starts_with("1. Chez Paul  80/100\n"), "{text}");
        assert!(text.contains("2 Rue Oberkampf"));
        assert!(text.contains("+4 min"));
        assert!(text.contains("-4 min"));
        assert!(text.contains("https://www.openstreetmap.org/node/42"));
        assert!(text.contains("https://www.google.com/maps/search/?api=1&query=Chez+Paul+2+Rue+Oberkampf"), "{text}");
        assert!(text.contains("... 1 more"));
    }

    #[test]
    fn test_render_empty_plan() {
        let (mut plan, participants) = plan();
        plan.venues.clear();
        assert_eq!(render_plan(&plan, &participants, 5), "No venue found in this area\n");
    }
}
