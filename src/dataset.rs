//! Immutable snapshot of the loaded election results.
//!
//! The snapshot is built once from the loaded rows and never modified afterwards. Rows are grouped
//! into contests (year, state and constituency), and each contest is ranked by descending votes.

use crate::models::{Candidacy, ElectionRecord, Year};
use crate::stats;

use std::collections::BTreeMap;
use std::ops::Range;

/// All records of a single contest, highest votes first.
#[derive(Clone, Copy, Debug)]
pub struct Contest<'a> {
    pub year: Year,
    pub state: &'a str,
    pub constituency: &'a str,
    /// Records of the contest ordered by rank. Never empty.
    pub records: &'a [ElectionRecord],
}

impl<'a> Contest<'a> {
    /// The winning record.
    pub fn winner(&self) -> &'a ElectionRecord {
        &self.records[0]
    }

    /// The second placed record, if the contest had more than one candidate.
    pub fn runner_up(&self) -> Option<&'a ElectionRecord> {
        self.records.get(1)
    }

    /// Votes cast for all candidates.
    pub fn total_votes(&self) -> u64 {
        self.records.iter().map(|record| record.votes).sum()
    }

    /// Difference in votes between the winner and the runner up.
    ///
    /// A margin published with the winner's row takes precedence, since files listing only
    /// winners have no runner up. Otherwise an uncontested winner's margin is its full vote count.
    pub fn margin(&self) -> u64 {
        if let Some(margin) = self.winner().margin {
            return margin;
        }
        let runner_up = self.runner_up().map_or(0, |record| record.votes);
        self.winner().votes - runner_up
    }

    /// Unrounded margin as a percentage of the votes cast.
    ///
    /// Uses the published percentage when the winner's row has one.
    pub fn margin_percent(&self) -> f64 {
        match self.winner().margin_percent {
            Some(percent) => percent,
            None => stats::raw_percentage(self.margin(), self.total_votes()),
        }
    }

    /// Registered electors, if any record of the contest carries them.
    pub fn electors(&self) -> Option<u64> {
        self.records.iter().find_map(|record| record.electors)
    }

    /// Reservation category, if any record of the contest carries it.
    pub fn constituency_type(&self) -> Option<&'a str> {
        self.records
            .iter()
            .find_map(|record| record.constituency_type.as_deref())
    }

    /// Unrounded turnout: votes cast as a percentage of electors.
    ///
    /// Without an electors count, falls back to a published turnout percentage.
    pub fn turnout(&self) -> Option<f64> {
        match self.electors() {
            Some(electors) if electors > 0 => {
                Some(stats::raw_percentage(self.total_votes(), electors))
            }
            _ => self.records.iter().find_map(|record| record.turnout),
        }
    }
}

/// The election results served by the API.
#[derive(Debug, Default)]
pub struct ElectionData {
    /// Records ordered by year, state, constituency and then rank.
    records: Vec<ElectionRecord>,
    /// Index ranges into `records`, one per contest.
    contests: Vec<Range<usize>>,
}

impl ElectionData {
    /// Build a snapshot from loaded rows.
    ///
    /// Within a contest, records are ranked by descending votes. Equal votes keep their source
    /// order, so the candidate listed first wins a tie.
    ///
    /// # Arguments
    ///
    /// * `rows`: Loaded rows in source order
    pub fn new(rows: Vec<Candidacy>) -> Self {
        let mut groups: BTreeMap<(Year, String, String), Vec<Candidacy>> = BTreeMap::new();
        let capacity = rows.len();
        for row in rows {
            groups
                .entry((row.year, row.state.clone(), row.constituency.clone()))
                .or_default()
                .push(row);
        }

        let mut records = Vec::with_capacity(capacity);
        let mut contests = Vec::with_capacity(groups.len());
        for (_, mut group) in groups {
            // Stable sort.
            group.sort_by(|a, b| b.votes.cmp(&a.votes));
            let total_votes = group.iter().map(|row| row.votes).sum();
            let start = records.len();
            for (index, row) in group.into_iter().enumerate() {
                records.push(ElectionRecord {
                    year: row.year,
                    state: row.state,
                    constituency: row.constituency,
                    party: row.party,
                    candidate: row.candidate,
                    votes: row.votes,
                    electors: row.electors,
                    constituency_type: row.constituency_type,
                    rank: index as u32 + 1,
                    winner: index == 0,
                    vote_share: stats::percentage(row.votes, total_votes),
                    margin: row.margin,
                    margin_percent: row.margin_percent,
                    turnout: row.turnout,
                });
            }
            contests.push(start..records.len());
        }

        ElectionData { records, contests }
    }

    /// All records, ordered by year, state, constituency and rank.
    pub fn records(&self) -> &[ElectionRecord] {
        &self.records
    }

    /// Whether no records were loaded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over contests in year, state and constituency order.
    pub fn contests(&self) -> impl Iterator<Item = Contest<'_>> + '_ {
        self.contests.iter().map(move |range| {
            let records = &self.records[range.clone()];
            let first = &records[0];
            Contest {
                year: first.year,
                state: &first.state,
                constituency: &first.constituency,
                records,
            }
        })
    }

    /// Iterate over the winning record of every contest.
    pub fn winners(&self) -> impl Iterator<Item = &ElectionRecord> + '_ {
        self.records.iter().filter(|record| record.winner)
    }
}
