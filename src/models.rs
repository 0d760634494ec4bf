//! Data types and associated functions and methods

use crate::error::ElectionError;
use crate::validated_query::{FromQueryParams, QueryParams};

use serde::Serialize;
use std::collections::BTreeMap;
use validator::Validate;

/// An election year, e.g. 2019.
pub type Year = u16;

/// One candidate's result in one constituency and year, as loaded from the source data.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidacy {
    /// Election year
    pub year: Year,
    /// State or union territory
    pub state: String,
    /// Parliamentary constituency name
    pub constituency: String,
    /// Party name
    pub party: String,
    /// Candidate name
    pub candidate: String,
    /// Votes received
    pub votes: u64,
    /// Registered electors in the constituency, where known
    pub electors: Option<u64>,
    /// Reservation category of the constituency, e.g. GEN, SC or ST
    pub constituency_type: Option<String>,
    /// Winning margin in votes as published with the results
    pub margin: Option<u64>,
    /// Winning margin as a percentage of votes cast, as published with the results
    pub margin_percent: Option<f64>,
    /// Turnout percentage as published with the results
    pub turnout: Option<f64>,
}

impl Candidacy {
    /// Return a Candidacy object without an electors count.
    pub fn new(
        year: Year,
        state: &str,
        constituency: &str,
        party: &str,
        candidate: &str,
        votes: u64,
    ) -> Self {
        Candidacy {
            year,
            state: state.to_string(),
            constituency: constituency.to_string(),
            party: party.to_string(),
            candidate: candidate.to_string(),
            votes,
            electors: None,
            constituency_type: None,
            margin: None,
            margin_percent: None,
            turnout: None,
        }
    }

    /// Set the electors count.
    pub fn with_electors(mut self, electors: u64) -> Self {
        self.electors = Some(electors);
        self
    }

    /// Set the constituency's reservation category.
    pub fn with_type(mut self, constituency_type: &str) -> Self {
        self.constituency_type = Some(constituency_type.to_string());
        self
    }

    /// Set the published winning margin, in votes and as a percentage.
    pub fn with_margin(mut self, margin: Option<u64>, margin_percent: f64) -> Self {
        self.margin = margin;
        self.margin_percent = Some(margin_percent);
        self
    }

    /// Set the published turnout percentage.
    pub fn with_turnout(mut self, turnout: f64) -> Self {
        self.turnout = Some(turnout);
        self
    }
}

/// A candidate's result with the fields derived from its contest.
///
/// A contest is the group of records sharing year, state and constituency.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ElectionRecord {
    pub year: Year,
    pub state: String,
    pub constituency: String,
    pub party: String,
    pub candidate: String,
    pub votes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub electors: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constituency_type: Option<String>,
    /// 1-based position within the contest by descending votes
    pub rank: u32,
    /// Whether this record won its contest
    pub winner: bool,
    /// Percentage of the contest's votes
    pub vote_share: f64,
    /// Published winning margin in votes, for files listing only winners
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<u64>,
    /// Published winning margin percentage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_percent: Option<f64>,
    /// Published turnout percentage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turnout: Option<f64>,
}

/// A seat won by a party.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SeatWon {
    pub constituency: String,
    pub state: String,
    pub candidate: String,
    pub votes: u64,
    pub margin: u64,
    pub margin_percent: f64,
}

/// Aggregate performance of one party in one year.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PartyYearStats {
    pub seats_won: u64,
    pub total_votes: u64,
    pub constituencies_contested: u64,
    /// Seats won as a percentage of all seats that year
    pub seat_share: f64,
    /// Votes as a percentage of all votes cast that year
    pub vote_share: f64,
    /// Seats won, in state and constituency order
    pub seats: Vec<SeatWon>,
}

/// Party performance keyed by year.
pub type PartyPerformance = BTreeMap<Year, PartyYearStats>;

/// Result of comparing several parties.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PartyComparison {
    /// Performance of every requested party found in the data
    pub parties: BTreeMap<String, PartyPerformance>,
    /// Requested parties not found in the data, in request order
    pub unknown: Vec<String>,
}

/// Seats won keyed by state, then party, then year.
pub type StatePartyTrends = BTreeMap<String, BTreeMap<String, BTreeMap<Year, u64>>>;

/// Vote share within the state keyed by state, then party, then year.
pub type StateVoteShareTrends = BTreeMap<String, BTreeMap<String, BTreeMap<Year, f64>>>;

/// The outcome of a single contest.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ContestResult {
    pub constituency: String,
    pub state: String,
    pub winner: String,
    pub party: String,
    pub votes: u64,
    pub total_votes: u64,
    pub margin: u64,
    pub margin_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turnout: Option<f64>,
}

/// Overview of one general election.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ElectionSummary {
    pub year: Year,
    pub total_seats: u64,
    pub total_votes: u64,
    /// Seats won per party
    pub party_seats: BTreeMap<String, u64>,
    pub avg_turnout: Option<f64>,
    pub constituencies: Vec<ContestResult>,
}

/// Seat counts of leading parties across several years.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct YearComparison {
    pub years: Vec<Year>,
    /// Seats won keyed by party, then year
    pub party_seats: BTreeMap<String, BTreeMap<Year, u64>>,
    /// Average turnout per year
    pub turnout: BTreeMap<Year, Option<f64>>,
}

/// Average turnout overall and per state.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TurnoutReport {
    /// Average turnout keyed by year
    pub years: BTreeMap<Year, f64>,
    /// Average turnout keyed by state, then year
    pub states: BTreeMap<String, BTreeMap<Year, f64>>,
}

/// Winning margin statistics for one year.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MarginStats {
    pub avg_margin_percent: f64,
    /// Contests won by less than 1% of votes
    pub close_contests: u64,
    /// Contests won by more than 20% of votes
    pub landslide_wins: u64,
}

/// Names matching a search query.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SearchResults {
    pub constituencies: Vec<String>,
    pub candidates: Vec<String>,
    pub parties: Vec<String>,
}

/// Seat trends of parties that won seats in more than one election.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PartyTrends {
    pub years: Vec<Year>,
    /// Seats won per year, aligned with `years`
    pub seats: BTreeMap<String, Vec<u64>>,
}

/// A state's results for one year.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StateYear {
    pub total_seats: u64,
    pub party_seats: BTreeMap<String, u64>,
    pub vote_share: BTreeMap<String, f64>,
    pub avg_turnout: Option<f64>,
}

/// A state's results across all years.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StateSummary {
    pub state: String,
    pub years: BTreeMap<Year, StateYear>,
}

/// Results of one constituency type (reservation category) across all years.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConstituencyTypeStats {
    /// Seats of this type keyed by year
    pub seats: BTreeMap<Year, u64>,
    /// Seats won keyed by party, then year
    pub party_seats: BTreeMap<String, BTreeMap<Year, u64>>,
    /// Average turnout keyed by year
    pub avg_turnout: BTreeMap<Year, Option<f64>>,
}

/// Results grouped by constituency type.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConstituencyTypeReport {
    pub years: Vec<Year>,
    pub types: Vec<String>,
    pub data: BTreeMap<String, ConstituencyTypeStats>,
}

/// Description of the API returned from the index route.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ApiIndex {
    pub message: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<String>,
}

/// Parse an election year from request input.
pub fn parse_year(raw: &str) -> Result<Year, ElectionError> {
    raw.trim()
        .parse()
        .map_err(|_| ElectionError::InvalidInput(format!("invalid year {:?}", raw)))
}

/// Return the non-blank values of a repeated query parameter.
fn non_blank(params: &QueryParams, key: &str) -> Vec<String> {
    params
        .get_all(key)
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

/// Query parameters of the party comparison
#[derive(Debug, PartialEq, Validate)]
pub struct PartiesQuery {
    /// Parties to compare, from repeated `parties` parameters
    #[validate(length(min = 1, message = "at least one party must be specified"))]
    pub parties: Vec<String>,
}

impl FromQueryParams for PartiesQuery {
    fn from_query_params(params: &QueryParams) -> Result<Self, ElectionError> {
        Ok(PartiesQuery {
            parties: non_blank(params, "parties"),
        })
    }
}

/// Query parameters of the year comparison
#[derive(Debug, PartialEq, Validate)]
pub struct YearsQuery {
    /// Years to compare, from repeated `years` parameters
    #[validate(length(min = 1, message = "at least one year must be specified"))]
    pub years: Vec<Year>,
}

impl FromQueryParams for YearsQuery {
    fn from_query_params(params: &QueryParams) -> Result<Self, ElectionError> {
        let years = non_blank(params, "years")
            .iter()
            .map(|year| parse_year(year))
            .collect::<Result<_, _>>()?;
        Ok(YearsQuery { years })
    }
}

/// Query parameters of the search
#[derive(Debug, PartialEq, Validate)]
pub struct SearchQuery {
    #[validate(length(min = 1, message = "search query must not be empty"))]
    pub q: String,
}

impl FromQueryParams for SearchQuery {
    fn from_query_params(params: &QueryParams) -> Result<Self, ElectionError> {
        Ok(SearchQuery {
            q: params.get("q").unwrap_or_default().trim().to_string(),
        })
    }
}

/// Return the first non-blank value of a query parameter.
fn first_non_blank(params: &QueryParams, key: &str) -> Option<String> {
    non_blank(params, key).into_iter().next()
}

/// Optional state filter
#[derive(Debug, PartialEq, Validate)]
pub struct StateQuery {
    /// Restrict results to this state. Blank means no restriction.
    pub state: Option<String>,
}

impl FromQueryParams for StateQuery {
    fn from_query_params(params: &QueryParams) -> Result<Self, ElectionError> {
        Ok(StateQuery {
            state: first_non_blank(params, "state"),
        })
    }
}

/// Optional state and party filters of the state trends
#[derive(Debug, Default, PartialEq, Validate)]
pub struct TrendQuery {
    pub state: Option<String>,
    pub party: Option<String>,
}

impl FromQueryParams for TrendQuery {
    fn from_query_params(params: &QueryParams) -> Result<Self, ElectionError> {
        Ok(TrendQuery {
            state: first_non_blank(params, "state"),
            party: first_non_blank(params, "party"),
        })
    }
}

/// Optional constituency type filter, from the `type` parameter
#[derive(Debug, PartialEq, Validate)]
pub struct ConstituencyTypeQuery {
    pub constituency_type: Option<String>,
}

impl FromQueryParams for ConstituencyTypeQuery {
    fn from_query_params(params: &QueryParams) -> Result<Self, ElectionError> {
        Ok(ConstituencyTypeQuery {
            constituency_type: first_non_blank(params, "type"),
        })
    }
}
