use crate::constants::{CONFERENCE_HEADER, JOURNAL_HEADER, LIST_SEPARATOR};

/// One output row, built from a single chapter page or journal article.
#[derive(Debug, Clone, PartialEq)]
pub struct PublicationRecord {
    pub venue: String,
    pub year: String,
    pub title: String,
    pub authors: Vec<String>,
    pub affiliations: Vec<String>,
    /// Deduplicated, in order of first appearance.
    pub countries: Vec<String>,
    pub citation_count: u64,
    pub url: String,
    pub page_numbers: String,
    pub abstract_text: String,
    /// Identifier used for the citation lookup; not written out.
    pub doi: String,
    pub extras: RecordExtras,
}

/// Columns that exist for only one of the two pipelines.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordExtras {
    Conference {
        track: String,
        keywords: Vec<String>,
    },
    Journal {
        author_keywords: Vec<String>,
        index_keywords: Vec<String>,
        volume: String,
        issue: String,
        issue_identifier: String,
    },
}

impl PublicationRecord {
    pub fn header(&self) -> &'static [&'static str] {
        match self.extras {
            RecordExtras::Conference { .. } => CONFERENCE_HEADER,
            RecordExtras::Journal { .. } => JOURNAL_HEADER,
        }
    }

    /// Flatten into CSV cells, in the order of [`PublicationRecord::header`].
    pub fn to_row(&self) -> Vec<String> {
        let mut row = vec![
            self.venue.clone(),
            self.year.clone(),
            self.title.clone(),
            join_list(&self.authors),
            join_list(&self.affiliations),
            join_list(&self.countries),
        ];
        match &self.extras {
            RecordExtras::Conference { track, keywords } => {
                row.push(track.clone());
                row.push(join_list(keywords));
                row.push(self.citation_count.to_string());
            }
            RecordExtras::Journal {
                author_keywords,
                index_keywords,
                volume,
                issue,
                issue_identifier,
            } => {
                row.push(join_list(author_keywords));
                row.push(join_list(index_keywords));
                row.push(volume.clone());
                row.push(issue.clone());
                row.push(issue_identifier.clone());
                row.push(self.citation_count.to_string());
            }
        }
        row.push(self.url.clone());
        row.push(self.page_numbers.clone());
        row.push(self.abstract_text.clone());
        row
    }
}

pub fn join_list(items: &[String]) -> String {
    items.join(LIST_SEPARATOR)
}

/// A top-level unit of work: one conference book, or one journal year query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnit {
    pub year: String,
    pub label: String,
    pub target: String,
}

/// Core trait that both publication sources implement
#[async_trait::async_trait]
pub trait PublicationSource: Send + Sync {
    /// Venue tag written on every row of this source
    fn venue(&self) -> &str;

    fn header(&self) -> &'static [&'static str];

    /// Resolve the ordered list of work units for the configured years.
    async fn work_units(&self) -> crate::error::Result<Vec<WorkUnit>>;

    /// Collect and enrich every record of one unit. Failures inside the unit
    /// are logged and yield fewer (or no) records.
    async fn collect(&self, unit: &WorkUnit) -> crate::error::Result<Vec<PublicationRecord>>;
}
