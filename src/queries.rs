//! Aggregate queries over the election results.
//!
//! Every query is a read-only method on [ElectionData]. Each one filters records, groups them by
//! the remaining key and reduces each group with a count, a sum or the winner flag.

use crate::dataset::{Contest, ElectionData};
use crate::error::{ElectionError, EntityKind};
use crate::models::{
    ConstituencyTypeReport, ConstituencyTypeStats, ContestResult, ElectionRecord,
    ElectionSummary, MarginStats, PartyComparison, PartyPerformance, PartyTrends, PartyYearStats,
    SearchResults, SeatWon, StatePartyTrends, StateSummary, StateVoteShareTrends, StateYear,
    TurnoutReport, Year, YearComparison,
};
use crate::stats;

use std::collections::{BTreeMap, BTreeSet};

/// Maximum number of matches returned per category by [ElectionData::search].
pub const SEARCH_LIMIT: usize = 10;

/// Number of leading parties per year included in [ElectionData::compare_years].
pub const TOP_PARTIES_PER_YEAR: usize = 10;

/// Contests won by less than this percentage of votes are close.
pub const CLOSE_CONTEST_PERCENT: f64 = 1.0;

/// Contests won by more than this percentage of votes are landslides.
pub const LANDSLIDE_PERCENT: f64 = 20.0;

/// Seats and votes over all contests of a year.
#[derive(Clone, Copy, Debug, Default)]
struct YearTotals {
    seats: u64,
    votes: u64,
}

/// Running totals for one party in one year.
#[derive(Debug, Default)]
struct PartyTally {
    votes: u64,
    contested: u64,
    seats: Vec<SeatWon>,
}

/// Running totals for one constituency type.
#[derive(Debug, Default)]
struct TypeTally<'a> {
    seats: BTreeMap<Year, u64>,
    party_seats: BTreeMap<&'a str, BTreeMap<Year, u64>>,
    turnouts: BTreeMap<Year, Vec<f64>>,
}

/// Running totals for one state in one year.
#[derive(Debug, Default)]
struct StateTally {
    seats: u64,
    votes: u64,
    party_seats: BTreeMap<String, u64>,
    party_votes: BTreeMap<String, u64>,
    turnouts: Vec<f64>,
}

impl ElectionData {
    /// Distinct election years, ascending.
    pub fn years(&self) -> Vec<Year> {
        self.records()
            .iter()
            .map(|record| record.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct constituency names, sorted.
    pub fn constituencies(&self) -> Vec<String> {
        self.distinct(|record| &record.constituency)
    }

    /// Distinct party names, sorted.
    pub fn parties(&self) -> Vec<String> {
        self.distinct(|record| &record.party)
    }

    /// Distinct state names, sorted.
    pub fn states(&self) -> Vec<String> {
        self.distinct(|record| &record.state)
    }

    fn distinct<F>(&self, field: F) -> Vec<String>
    where
        F: Fn(&ElectionRecord) -> &String,
    {
        self.records()
            .iter()
            .map(field)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Every result for a constituency, by year and then descending votes.
    ///
    /// # Arguments
    ///
    /// * `name`: Constituency name. Must match exactly.
    pub fn constituency_results(&self, name: &str) -> Result<Vec<ElectionRecord>, ElectionError> {
        let mut results: Vec<ElectionRecord> = self
            .records()
            .iter()
            .filter(|record| record.constituency == name)
            .cloned()
            .collect();
        if results.is_empty() {
            return Err(ElectionError::not_found(EntityKind::Constituency, name));
        }
        // Stable, so equal votes stay in rank order.
        results.sort_by(|a, b| a.year.cmp(&b.year).then(b.votes.cmp(&a.votes)));
        Ok(results)
    }

    /// Seats, votes and contested constituencies of a party for each year it contested.
    ///
    /// # Arguments
    ///
    /// * `name`: Party name. Must match exactly.
    pub fn party_performance(&self, name: &str) -> Result<PartyPerformance, ElectionError> {
        let performance = self.party_performance_with(name, &self.year_totals());
        if performance.is_empty() {
            return Err(ElectionError::not_found(EntityKind::Party, name));
        }
        Ok(performance)
    }

    fn year_totals(&self) -> BTreeMap<Year, YearTotals> {
        let mut totals: BTreeMap<Year, YearTotals> = BTreeMap::new();
        for record in self.records() {
            let entry = totals.entry(record.year).or_default();
            entry.seats += u64::from(record.winner);
            entry.votes += record.votes;
        }
        totals
    }

    fn party_performance_with(
        &self,
        name: &str,
        totals: &BTreeMap<Year, YearTotals>,
    ) -> PartyPerformance {
        let mut tallies: BTreeMap<Year, PartyTally> = BTreeMap::new();
        for contest in self.contests() {
            for record in contest.records.iter().filter(|record| record.party == name) {
                let tally = tallies.entry(record.year).or_default();
                tally.votes += record.votes;
                tally.contested += 1;
                if record.winner {
                    tally.seats.push(SeatWon {
                        constituency: record.constituency.clone(),
                        state: record.state.clone(),
                        candidate: record.candidate.clone(),
                        votes: record.votes,
                        margin: contest.margin(),
                        margin_percent: stats::round(contest.margin_percent()),
                    });
                }
            }
        }
        tallies
            .into_iter()
            .map(|(year, tally)| {
                let year_totals = totals.get(&year).copied().unwrap_or_default();
                let seats_won = tally.seats.len() as u64;
                let stats = PartyYearStats {
                    seats_won,
                    total_votes: tally.votes,
                    constituencies_contested: tally.contested,
                    seat_share: stats::percentage(seats_won, year_totals.seats),
                    vote_share: stats::percentage(tally.votes, year_totals.votes),
                    seats: tally.seats,
                };
                (year, stats)
            })
            .collect()
    }

    /// Performance of several parties side by side.
    ///
    /// Names not present in the data are listed in [PartyComparison::unknown] rather than failing
    /// the request. Blank and repeated names are ignored.
    ///
    /// # Arguments
    ///
    /// * `names`: Party names to compare
    pub fn compare_parties<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<PartyComparison, ElectionError> {
        let totals = self.year_totals();
        let mut requested = BTreeSet::new();
        let mut parties = BTreeMap::new();
        let mut unknown = Vec::new();
        for name in names.iter().map(|name| name.as_ref().trim()) {
            if name.is_empty() || !requested.insert(name) {
                continue;
            }
            let performance = self.party_performance_with(name, &totals);
            if performance.is_empty() {
                unknown.push(name.to_string());
            } else {
                parties.insert(name.to_string(), performance);
            }
        }
        if requested.is_empty() {
            return Err(ElectionError::InvalidInput(
                "no parties specified".to_string(),
            ));
        }
        Ok(PartyComparison { parties, unknown })
    }

    /// Seats won by each party in each state and year.
    ///
    /// Parties that contested a state without winning show zero seats.
    pub fn state_party_trends(&self) -> StatePartyTrends {
        self.state_party_trends_where(|_| true)
    }

    /// [ElectionData::state_party_trends] restricted to a state, a party or both.
    ///
    /// A party that never contested the requested state gives an empty result.
    pub fn state_party_trends_for(
        &self,
        state: Option<&str>,
        party: Option<&str>,
    ) -> Result<StatePartyTrends, ElectionError> {
        self.check_trend_filter(state, party)?;
        Ok(self.state_party_trends_where(|record| trend_filter_matches(record, state, party)))
    }

    /// Each party's share of the votes cast in a state, per state and year.
    ///
    /// Parties appear only in the years they contested the state.
    ///
    /// # Arguments
    ///
    /// * `state`: Restrict to this state
    /// * `party`: Restrict to this party. Shares are still relative to all votes in the state.
    pub fn state_vote_share_trends(
        &self,
        state: Option<&str>,
        party: Option<&str>,
    ) -> Result<StateVoteShareTrends, ElectionError> {
        self.check_trend_filter(state, party)?;
        let mut totals: BTreeMap<(&str, Year), u64> = BTreeMap::new();
        let mut votes: BTreeMap<&str, BTreeMap<&str, BTreeMap<Year, u64>>> = BTreeMap::new();
        for record in self.records() {
            if !trend_filter_matches(record, state, None) {
                continue;
            }
            *totals
                .entry((record.state.as_str(), record.year))
                .or_default() += record.votes;
            if trend_filter_matches(record, None, party) {
                *votes
                    .entry(&record.state)
                    .or_default()
                    .entry(&record.party)
                    .or_default()
                    .entry(record.year)
                    .or_default() += record.votes;
            }
        }
        let shares = votes
            .into_iter()
            .map(|(state, parties)| {
                let parties = parties
                    .into_iter()
                    .map(|(party, by_year)| {
                        let by_year = by_year
                            .into_iter()
                            .map(|(year, party_votes)| {
                                let total = totals.get(&(state, year)).copied().unwrap_or(0);
                                (year, stats::percentage(party_votes, total))
                            })
                            .collect();
                        (party.to_string(), by_year)
                    })
                    .collect();
                (state.to_string(), parties)
            })
            .collect();
        Ok(shares)
    }

    /// Check that the states and parties of a trend filter exist.
    fn check_trend_filter(
        &self,
        state: Option<&str>,
        party: Option<&str>,
    ) -> Result<(), ElectionError> {
        if let Some(state) = state {
            if !self.records().iter().any(|record| record.state == state) {
                return Err(ElectionError::not_found(EntityKind::State, state));
            }
        }
        if let Some(party) = party {
            if !self.records().iter().any(|record| record.party == party) {
                return Err(ElectionError::not_found(EntityKind::Party, party));
            }
        }
        Ok(())
    }

    fn state_party_trends_where<P>(&self, predicate: P) -> StatePartyTrends
    where
        P: Fn(&ElectionRecord) -> bool,
    {
        let mut trends = StatePartyTrends::new();
        for record in self.records().iter().filter(|record| predicate(*record)) {
            *trends
                .entry(record.state.clone())
                .or_default()
                .entry(record.party.clone())
                .or_default()
                .entry(record.year)
                .or_default() += u64::from(record.winner);
        }
        trends
    }

    /// Overview of a single election.
    pub fn election_summary(&self, year: Year) -> Result<ElectionSummary, ElectionError> {
        let contests: Vec<Contest> = self.contests().filter(|c| c.year == year).collect();
        if contests.is_empty() {
            return Err(ElectionError::not_found(EntityKind::Year, year));
        }

        let mut party_seats = BTreeMap::new();
        let mut total_votes = 0;
        let mut constituencies = Vec::with_capacity(contests.len());
        for contest in &contests {
            let winner = contest.winner();
            *party_seats.entry(winner.party.clone()).or_insert(0) += 1;
            total_votes += contest.total_votes();
            constituencies.push(ContestResult {
                constituency: contest.constituency.to_string(),
                state: contest.state.to_string(),
                winner: winner.candidate.clone(),
                party: winner.party.clone(),
                votes: winner.votes,
                total_votes: contest.total_votes(),
                margin: contest.margin(),
                margin_percent: stats::round(contest.margin_percent()),
                turnout: contest.turnout().map(stats::round),
            });
        }

        Ok(ElectionSummary {
            year,
            total_seats: contests.len() as u64,
            total_votes,
            party_seats,
            avg_turnout: stats::mean(contests.iter().filter_map(Contest::turnout)),
            constituencies,
        })
    }

    /// Seats of the leading parties and average turnout across several elections.
    ///
    /// The parties compared are the union of the [TOP_PARTIES_PER_YEAR] parties with most seats
    /// in each requested year.
    pub fn compare_years(&self, years: &[Year]) -> Result<YearComparison, ElectionError> {
        if years.is_empty() {
            return Err(ElectionError::InvalidInput("no years specified".to_string()));
        }
        let mut requested: Vec<Year> = Vec::with_capacity(years.len());
        for year in years {
            if !requested.contains(year) {
                requested.push(*year);
            }
        }
        let known = self.years();
        if let Some(year) = requested.iter().find(|year| !known.contains(year)) {
            return Err(ElectionError::not_found(EntityKind::Year, year));
        }

        let mut seats: BTreeMap<Year, BTreeMap<&str, u64>> = BTreeMap::new();
        for record in self.winners().filter(|r| requested.contains(&r.year)) {
            *seats
                .entry(record.year)
                .or_default()
                .entry(&record.party)
                .or_default() += 1;
        }

        let mut leaders = BTreeSet::new();
        for year_seats in seats.values() {
            let mut ranked: Vec<(&str, u64)> = year_seats.iter().map(|(p, s)| (*p, *s)).collect();
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
            leaders.extend(ranked.into_iter().take(TOP_PARTIES_PER_YEAR).map(|(p, _)| p));
        }

        let party_seats = leaders
            .into_iter()
            .map(|party| {
                let by_year = requested
                    .iter()
                    .map(|year| {
                        let count = seats
                            .get(year)
                            .and_then(|year_seats| year_seats.get(party))
                            .copied()
                            .unwrap_or(0);
                        (*year, count)
                    })
                    .collect();
                (party.to_string(), by_year)
            })
            .collect();

        let turnout = requested
            .iter()
            .map(|year| {
                let turnouts = self
                    .contests()
                    .filter(|c| c.year == *year)
                    .filter_map(|c| c.turnout());
                (*year, stats::mean(turnouts))
            })
            .collect();

        Ok(YearComparison {
            years: requested,
            party_seats,
            turnout,
        })
    }

    /// Average turnout per year and per state.
    ///
    /// Only contests with a known electors count contribute.
    pub fn turnout(&self) -> TurnoutReport {
        let mut by_year: BTreeMap<Year, Vec<f64>> = BTreeMap::new();
        let mut by_state: BTreeMap<&str, BTreeMap<Year, Vec<f64>>> = BTreeMap::new();
        for contest in self.contests() {
            if let Some(turnout) = contest.turnout() {
                by_year.entry(contest.year).or_default().push(turnout);
                by_state
                    .entry(contest.state)
                    .or_default()
                    .entry(contest.year)
                    .or_default()
                    .push(turnout);
            }
        }

        fn averages(values: BTreeMap<Year, Vec<f64>>) -> BTreeMap<Year, f64> {
            values
                .into_iter()
                .filter_map(|(year, turnouts)| stats::mean(turnouts).map(|mean| (year, mean)))
                .collect()
        }

        TurnoutReport {
            years: averages(by_year),
            states: by_state
                .into_iter()
                .map(|(state, years)| (state.to_string(), averages(years)))
                .collect(),
        }
    }

    /// Winning margin statistics per year.
    pub fn win_margins(&self) -> BTreeMap<Year, MarginStats> {
        let mut margins: BTreeMap<Year, Vec<f64>> = BTreeMap::new();
        for contest in self.contests() {
            margins
                .entry(contest.year)
                .or_default()
                .push(contest.margin_percent());
        }
        margins
            .into_iter()
            .map(|(year, percents)| {
                let stats = MarginStats {
                    avg_margin_percent: stats::mean(percents.iter().copied()).unwrap_or(0.0),
                    close_contests: percents
                        .iter()
                        .filter(|p| **p < CLOSE_CONTEST_PERCENT)
                        .count() as u64,
                    landslide_wins: percents
                        .iter()
                        .filter(|p| **p > LANDSLIDE_PERCENT)
                        .count() as u64,
                };
                (year, stats)
            })
            .collect()
    }

    /// Case-insensitive substring search over constituencies, winning candidates and parties.
    ///
    /// Each list is sorted and holds at most [SEARCH_LIMIT] names.
    pub fn search(&self, query: &str) -> Result<SearchResults, ElectionError> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Err(ElectionError::InvalidInput(
                "no search query provided".to_string(),
            ));
        }
        let matching = |names: Vec<String>| -> Vec<String> {
            names
                .into_iter()
                .filter(|name| name.to_lowercase().contains(&needle))
                .take(SEARCH_LIMIT)
                .collect()
        };
        let candidates = self
            .winners()
            .map(|record| record.candidate.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Ok(SearchResults {
            constituencies: matching(self.constituencies()),
            candidates: matching(candidates),
            parties: matching(self.parties()),
        })
    }

    /// Seats per year for parties that won seats in at least two elections.
    pub fn party_trends(&self) -> PartyTrends {
        let years = self.years();
        let mut seats: BTreeMap<&str, BTreeMap<Year, u64>> = BTreeMap::new();
        for record in self.winners() {
            *seats
                .entry(&record.party)
                .or_default()
                .entry(record.year)
                .or_default() += 1;
        }
        let seats = seats
            .into_iter()
            .filter(|(_, by_year)| by_year.len() >= 2)
            .map(|(party, by_year)| {
                let aligned = years
                    .iter()
                    .map(|year| by_year.get(year).copied().unwrap_or(0))
                    .collect();
                (party.to_string(), aligned)
            })
            .collect();
        PartyTrends { years, seats }
    }

    /// Seats, vote share and turnout of a state for each year it has results.
    pub fn state_summary(&self, state: &str) -> Result<StateSummary, ElectionError> {
        let mut tallies: BTreeMap<Year, StateTally> = BTreeMap::new();
        for contest in self.contests().filter(|c| c.state == state) {
            let tally = tallies.entry(contest.year).or_default();
            tally.seats += 1;
            *tally
                .party_seats
                .entry(contest.winner().party.clone())
                .or_default() += 1;
            for record in contest.records {
                tally.votes += record.votes;
                *tally.party_votes.entry(record.party.clone()).or_default() += record.votes;
            }
            if let Some(turnout) = contest.turnout() {
                tally.turnouts.push(turnout);
            }
        }
        if tallies.is_empty() {
            return Err(ElectionError::not_found(EntityKind::State, state));
        }

        let years = tallies
            .into_iter()
            .map(|(year, tally)| {
                let vote_share = tally
                    .party_votes
                    .iter()
                    .map(|(party, votes)| (party.clone(), stats::percentage(*votes, tally.votes)))
                    .collect();
                let state_year = StateYear {
                    total_seats: tally.seats,
                    party_seats: tally.party_seats,
                    vote_share,
                    avg_turnout: stats::mean(tally.turnouts),
                };
                (year, state_year)
            })
            .collect();
        Ok(StateSummary {
            state: state.to_string(),
            years,
        })
    }

    /// Seats, seats per party and average turnout of each constituency type per year.
    ///
    /// Contests without a type are left out. Every loaded year appears for every type, with zero
    /// seats where the type had none.
    ///
    /// # Arguments
    ///
    /// * `constituency_type`: Restrict the report to this type
    pub fn constituency_types(
        &self,
        constituency_type: Option<&str>,
    ) -> Result<ConstituencyTypeReport, ElectionError> {
        let mut tallies: BTreeMap<&str, TypeTally> = BTreeMap::new();
        for contest in self.contests() {
            let kind = match contest.constituency_type() {
                Some(kind) => kind,
                None => continue,
            };
            if constituency_type.map_or(false, |wanted| wanted != kind) {
                continue;
            }
            let tally = tallies.entry(kind).or_default();
            *tally.seats.entry(contest.year).or_default() += 1;
            *tally
                .party_seats
                .entry(&contest.winner().party)
                .or_default()
                .entry(contest.year)
                .or_default() += 1;
            if let Some(turnout) = contest.turnout() {
                tally.turnouts.entry(contest.year).or_default().push(turnout);
            }
        }
        if let Some(kind) = constituency_type {
            if tallies.is_empty() {
                return Err(ElectionError::not_found(EntityKind::ConstituencyType, kind));
            }
        }

        let years = self.years();
        let every_year = |counts: &BTreeMap<Year, u64>| -> BTreeMap<Year, u64> {
            years
                .iter()
                .map(|year| (*year, counts.get(year).copied().unwrap_or(0)))
                .collect()
        };
        let data: BTreeMap<String, ConstituencyTypeStats> = tallies
            .into_iter()
            .map(|(kind, mut tally)| {
                let type_stats = ConstituencyTypeStats {
                    seats: every_year(&tally.seats),
                    party_seats: tally
                        .party_seats
                        .iter()
                        .map(|(party, seats)| (party.to_string(), every_year(seats)))
                        .collect(),
                    avg_turnout: years
                        .iter()
                        .map(|year| {
                            let turnouts = tally.turnouts.remove(year).unwrap_or_default();
                            (*year, stats::mean(turnouts))
                        })
                        .collect(),
                };
                (kind.to_string(), type_stats)
            })
            .collect();
        Ok(ConstituencyTypeReport {
            types: data.keys().cloned().collect(),
            years,
            data,
        })
    }

    /// [ElectionData::state_summary] for every state.
    pub fn all_state_summaries(&self) -> Result<BTreeMap<String, StateSummary>, ElectionError> {
        self.states()
            .into_iter()
            .map(|state| self.state_summary(&state).map(|summary| (state, summary)))
            .collect()
    }
}

fn trend_filter_matches(record: &ElectionRecord, state: Option<&str>, party: Option<&str>) -> bool {
    state.map_or(true, |state| record.state == state)
        && party.map_or(true, |party| record.party == party)
}
