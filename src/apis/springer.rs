use crate::apis::serpapi::CitationLookup;
use crate::app::ports::HttpClientPort;
use crate::config::Config;
use crate::constants::CONFERENCE_HEADER;
use crate::error::{Result, ScraperError};
use crate::ingest::fetch_checked;
use crate::normalize::{clean_text, countries_from_affiliations, doi_from_chapter_href, strip_pages_label};
use crate::types::{PublicationRecord, PublicationSource, RecordExtras, WorkUnit};
use once_cell::sync::Lazy;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid CSS")
}

// Conference series landing page
static TIMELINE: Lazy<Selector> = Lazy::new(|| selector("ol.app-conference-series-timeline"));
static TIMELINE_YEAR: Lazy<Selector> = Lazy::new(|| selector("li.app-conference-series-timeline__year"));
static YEAR_MARKER: Lazy<Selector> = Lazy::new(|| selector("span.app-conference-series-timeline__marker"));
static TIMELINE_ITEM: Lazy<Selector> = Lazy::new(|| {
    selector("ul.app-conference-series-timeline__list li.app-conference-series-timeline__item")
});
static BOOK_LINK: Lazy<Selector> = Lazy::new(|| selector("a.u-serif"));

// Proceedings book table of contents
static BOOK_TOC: Lazy<Selector> = Lazy::new(|| selector(r#"section[data-title="book-toc"]"#));
static TOC_GROUP: Lazy<Selector> = Lazy::new(|| selector("li.c-list-group__item"));
static PART_TITLE: Lazy<Selector> = Lazy::new(|| selector(r#"h3[data-title="part-title"]"#));
static CHAPTER: Lazy<Selector> = Lazy::new(|| selector(r#"li[data-test="chapter"]"#));
static CHAPTER_LINK: Lazy<Selector> = Lazy::new(|| selector("h4.c-card__title a"));
static AUTHOR_ITEM: Lazy<Selector> = Lazy::new(|| selector("li.c-author-list__item"));
static PAGE_NUMBER: Lazy<Selector> = Lazy::new(|| selector(r#"span[data-test="page-number"]"#));
static NEXT_PAGE: Lazy<Selector> =
    Lazy::new(|| selector(r#"a.c-pagination__link[data-test="next-page"]"#));

// Chapter detail page
static ABSTRACT_SECTION: Lazy<Selector> = Lazy::new(|| selector(r#"section[data-title="Abstract"]"#));
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| selector("p"));
static AFFILIATION: Lazy<Selector> = Lazy::new(|| {
    selector("ol.c-article-author-affiliation__list p.c-article-author-affiliation__address")
});
static KEYWORD: Lazy<Selector> = Lazy::new(|| selector("li.c-article-subject-list__subject span"));

fn element_text(element: ElementRef) -> String {
    clean_text(&element.text().collect::<String>())
}

fn first_text(scope: ElementRef, sel: &Selector) -> Option<String> {
    scope.select(sel).next().map(element_text)
}

/// One chapter listed in a book's table of contents.
#[derive(Debug, Clone, PartialEq)]
pub struct TocEntry {
    pub track: String,
    pub title: String,
    pub href: String,
    pub authors: Vec<String>,
    pub page_numbers: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookPage {
    pub entries: Vec<TocEntry>,
    pub next_page: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChapterDetails {
    pub abstract_text: Option<String>,
    pub affiliations: Vec<String>,
    pub countries: Vec<String>,
    pub keywords: Vec<String>,
}

/// Book links from the series timeline, for the allowed years only.
///
/// The timeline is assumed to list years newest-first: the walk stops at the
/// first year outside `target_years`, so an allowed year listed after an
/// excluded one is never visited.
pub fn parse_timeline(html: &str, target_years: &[String]) -> Vec<WorkUnit> {
    let document = Html::parse_document(html);
    let mut units = Vec::new();

    let Some(timeline) = document.select(&TIMELINE).next() else {
        warn!("No conference timeline found on series page");
        return units;
    };

    for year_item in timeline.select(&TIMELINE_YEAR) {
        let Some(year) = first_text(year_item, &YEAR_MARKER) else {
            debug!("Timeline entry without a year marker, skipping");
            continue;
        };
        if !target_years.iter().any(|y| *y == year) {
            debug!(%year, "Year outside target list, stopping timeline walk");
            break;
        }

        for item in year_item.select(&TIMELINE_ITEM) {
            let Some(link) = item.select(&BOOK_LINK).next() else {
                continue;
            };
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            units.push(WorkUnit {
                year: year.clone(),
                label: element_text(link),
                target: href.trim().to_string(),
            });
        }
    }

    units
}

/// Table-of-contents entries and the next-page link of one book page.
pub fn parse_book_page(html: &str) -> BookPage {
    let document = Html::parse_document(html);
    let mut entries = Vec::new();

    if let Some(toc) = document.select(&BOOK_TOC).next() {
        let groups: Vec<ElementRef> = toc.select(&TOC_GROUP).collect();
        if groups.is_empty() {
            // Books without parts list chapters directly
            entries.extend(toc.select(&CHAPTER).filter_map(|c| parse_toc_entry(c, "")));
        }
        for group in groups {
            let track = first_text(group, &PART_TITLE).unwrap_or_default();
            entries.extend(group.select(&CHAPTER).filter_map(|c| parse_toc_entry(c, &track)));
        }
    } else {
        warn!("No table of contents found on book page");
    }

    let next_page = document
        .select(&NEXT_PAGE)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty());

    BookPage { entries, next_page }
}

fn parse_toc_entry(chapter: ElementRef, track: &str) -> Option<TocEntry> {
    let link = chapter.select(&CHAPTER_LINK).next()?;
    let href = link.value().attr("href")?.trim().to_string();
    let authors = chapter
        .select(&AUTHOR_ITEM)
        .map(element_text)
        .filter(|a| !a.is_empty())
        .collect();
    let page_numbers = chapter
        .select(&PAGE_NUMBER)
        .next()
        .map(|span| strip_pages_label(&span.text().collect::<String>()))
        .unwrap_or_default();

    Some(TocEntry {
        track: track.to_string(),
        title: element_text(link),
        href,
        authors,
        page_numbers,
    })
}

/// Abstract, affiliations, countries and keywords of a chapter page.
pub fn parse_chapter_page(html: &str) -> ChapterDetails {
    let document = Html::parse_document(html);

    let abstract_text = document
        .select(&ABSTRACT_SECTION)
        .next()
        .and_then(|section| first_text(section, &PARAGRAPH));

    let affiliations: Vec<String> = document
        .select(&AFFILIATION)
        .map(element_text)
        .filter(|a| !a.is_empty())
        .collect();
    let countries = countries_from_affiliations(&affiliations);

    let keywords = document
        .select(&KEYWORD)
        .map(element_text)
        .filter(|k| !k.is_empty())
        .collect();

    ChapterDetails {
        abstract_text,
        affiliations,
        countries,
        keywords,
    }
}

fn absolute_url(base: &str, href: &str) -> Result<String> {
    let base = Url::parse(base).map_err(|e| ScraperError::invalid_url(base, e))?;
    let joined = base.join(href).map_err(|e| ScraperError::invalid_url(href, e))?;
    Ok(joined.to_string())
}

/// Conference pipeline over a Springer Link conference series.
pub struct SpringerConferenceCrawler {
    http: Arc<dyn HttpClientPort>,
    citations: CitationLookup,
    venue: String,
    series_url: String,
    base_url: String,
    target_years: Vec<String>,
    max_pages_per_book: usize,
}

impl SpringerConferenceCrawler {
    pub fn new(http: Arc<dyn HttpClientPort>, config: &Config) -> Self {
        Self {
            citations: CitationLookup::new(http.clone(), config),
            http,
            venue: config.conference.venue.clone(),
            series_url: config.conference.series_url.clone(),
            base_url: config.conference.base_url.clone(),
            target_years: config.target_years.clone(),
            max_pages_per_book: config.max_pages_per_book,
        }
    }

    /// Fetch a chapter's detail page and build its enriched record.
    /// Returns `None` when the detail page is unavailable.
    async fn build_record(&self, year: &str, entry: TocEntry) -> Option<PublicationRecord> {
        let chapter_url = match absolute_url(&self.base_url, &entry.href) {
            Ok(url) => url,
            Err(e) => {
                warn!("Skipping chapter '{}': {}", entry.title, e);
                return None;
            }
        };
        let resp = fetch_checked(&*self.http, &chapter_url, &chapter_url).await?;
        let details = parse_chapter_page(&resp.text());

        let doi = doi_from_chapter_href(&entry.href);
        let citation_count = self.citations.get_citation_count(&doi).await;

        Some(PublicationRecord {
            venue: self.venue.clone(),
            year: year.to_string(),
            title: entry.title,
            authors: entry.authors,
            affiliations: details.affiliations,
            countries: details.countries,
            citation_count,
            url: chapter_url,
            page_numbers: entry.page_numbers,
            abstract_text: details.abstract_text.unwrap_or_default(),
            doi,
            extras: RecordExtras::Conference {
                track: entry.track,
                keywords: details.keywords,
            },
        })
    }
}

#[async_trait::async_trait]
impl PublicationSource for SpringerConferenceCrawler {
    fn venue(&self) -> &str {
        &self.venue
    }

    fn header(&self) -> &'static [&'static str] {
        CONFERENCE_HEADER
    }

    #[instrument(skip(self))]
    async fn work_units(&self) -> Result<Vec<WorkUnit>> {
        let resp = self.http.get(&self.series_url).await?;
        if !resp.is_success() {
            return Err(ScraperError::Status {
                url: self.series_url.clone(),
                status: resp.status,
            });
        }

        let mut units = Vec::new();
        for mut unit in parse_timeline(&resp.text(), &self.target_years) {
            match absolute_url(&self.base_url, &unit.target) {
                Ok(url) => {
                    unit.target = url;
                    info!("Title is: {} for year {}", unit.label, unit.year);
                    units.push(unit);
                }
                Err(e) => warn!("Skipping {} ({}): {}", unit.label, unit.year, e),
            }
        }
        Ok(units)
    }

    /// Walk a book's pages in order, following next-page links until none is
    /// left, a link repeats, or the page ceiling is reached.
    #[instrument(skip(self, unit), fields(year = %unit.year, book = %unit.label))]
    async fn collect(&self, unit: &WorkUnit) -> Result<Vec<PublicationRecord>> {
        let mut records = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(unit.target.clone());
        let mut pages = 0usize;

        while let Some(page_url) = next.take() {
            if pages >= self.max_pages_per_book {
                warn!(pages, "Page limit reached, not following further pages");
                break;
            }
            if !visited.insert(page_url.clone()) {
                warn!("Pagination loops back to {}, stopping", page_url);
                break;
            }
            pages += 1;

            let Some(resp) = fetch_checked(&*self.http, &page_url, &page_url).await else {
                break;
            };
            let page = parse_book_page(&resp.text());
            debug!(entries = page.entries.len(), page = pages, "Parsed book page");

            for entry in page.entries {
                if let Some(record) = self.build_record(&unit.year, entry).await {
                    records.push(record);
                }
            }

            if let Some(href) = page.next_page {
                info!("Next page link is: {}", href);
                match absolute_url(&self.base_url, &href) {
                    Ok(url) => next = Some(url),
                    Err(e) => warn!("Unusable next page link, stopping: {}", e),
                }
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn years(list: &[&str]) -> Vec<String> {
        list.iter().map(|y| y.to_string()).collect()
    }

    const TIMELINE_HTML: &str = r#"
        <html><body>
        <ol class="app-conference-series-timeline">
          <li class="app-conference-series-timeline__year">
            <span class="app-conference-series-timeline__marker">2023</span>
            <ul class="app-conference-series-timeline__list">
              <li class="app-conference-series-timeline__item">
                <a class="u-serif" href="/book/10.1007/2023-a">Web Engineering
                   ICWE 2023</a>
              </li>
              <li class="app-conference-series-timeline__item">
                <a class="u-serif" href="/book/10.1007/2023-b">ICWE 2023 Workshops</a>
              </li>
            </ul>
          </li>
          <li class="app-conference-series-timeline__year">
            <span class="app-conference-series-timeline__marker">2022</span>
            <ul class="app-conference-series-timeline__list">
              <li class="app-conference-series-timeline__item">
                <a class="u-serif" href="/book/10.1007/2022">ICWE 2022</a>
              </li>
            </ul>
          </li>
          <li class="app-conference-series-timeline__year">
            <span class="app-conference-series-timeline__marker">2018</span>
            <ul class="app-conference-series-timeline__list">
              <li class="app-conference-series-timeline__item">
                <a class="u-serif" href="/book/10.1007/2018">ICWE 2018</a>
              </li>
            </ul>
          </li>
          <li class="app-conference-series-timeline__year">
            <span class="app-conference-series-timeline__marker">2019</span>
            <ul class="app-conference-series-timeline__list">
              <li class="app-conference-series-timeline__item">
                <a class="u-serif" href="/book/10.1007/2019">ICWE 2019</a>
              </li>
            </ul>
          </li>
        </ol>
        </body></html>
    "#;

    #[test]
    fn timeline_stops_at_first_year_outside_list() {
        let units = parse_timeline(
            TIMELINE_HTML,
            &years(&["2019", "2020", "2021", "2022", "2023"]),
        );
        let targets: Vec<&str> = units.iter().map(|u| u.target.as_str()).collect();
        assert_eq!(
            targets,
            vec!["/book/10.1007/2023-a", "/book/10.1007/2023-b", "/book/10.1007/2022"]
        );
        assert_eq!(units[0].year, "2023");
        assert_eq!(units[0].label, "Web Engineering ICWE 2023");
        assert_eq!(units[2].year, "2022");
    }

    #[test]
    fn timeline_stops_immediately_when_newest_year_is_excluded() {
        let units = parse_timeline(TIMELINE_HTML, &years(&["2022"]));
        assert!(units.is_empty());
    }

    #[test]
    fn missing_timeline_yields_nothing() {
        assert!(parse_timeline("<html><body></body></html>", &years(&["2023"])).is_empty());
    }

    const BOOK_HTML: &str = r#"
        <section data-title="book-toc">
          <ol>
            <li class="c-card c-card--flush c-list-group__item">
              <h3 data-title="part-title">Web Mining and Knowledge Extraction</h3>
              <ol>
                <li data-test="chapter">
                  <h4 class="c-card__title"><a href="/chapter/10.1007/978-3-031-34444-2_1">
                    Mining   Web Logs</a></h4>
                  <ul class="c-author-list"><li class="c-author-list__item">Ana Silva, João Costa</li></ul>
                  <span data-test="page-number">Pages 3-17</span>
                </li>
                <li data-test="chapter">
                  <h4 class="c-card__title">Front Matter</h4>
                </li>
              </ol>
            </li>
            <li class="c-card c-card--flush c-list-group__item">
              <h3 data-title="part-title">Demos</h3>
              <ol>
                <li data-test="chapter">
                  <h4 class="c-card__title"><a href="/chapter/10.1007/978-3-031-34444-2_2">A Demo</a></h4>
                  <span data-test="page-number">Pages 18-21</span>
                </li>
              </ol>
            </li>
          </ol>
        </section>
        <nav><a class="c-pagination__link" data-test="next-page" href="/book/10.1007/978-3-031-34444-2?page=2#toc">Next</a></nav>
    "#;

    #[test]
    fn book_page_entries_carry_track_and_pages() {
        let page = parse_book_page(BOOK_HTML);
        assert_eq!(page.entries.len(), 2);

        let first = &page.entries[0];
        assert_eq!(first.track, "Web Mining and Knowledge Extraction");
        assert_eq!(first.title, "Mining Web Logs");
        assert_eq!(first.href, "/chapter/10.1007/978-3-031-34444-2_1");
        assert_eq!(first.authors, vec!["Ana Silva, João Costa"]);
        assert_eq!(first.page_numbers, "3-17");

        let second = &page.entries[1];
        assert_eq!(second.track, "Demos");
        assert!(second.authors.is_empty());
        assert_eq!(second.page_numbers, "18-21");

        assert_eq!(
            page.next_page.as_deref(),
            Some("/book/10.1007/978-3-031-34444-2?page=2#toc")
        );
    }

    #[test]
    fn book_page_without_toc_or_next_link() {
        let page = parse_book_page("<html><body><p>Nothing here</p></body></html>");
        assert_eq!(page, BookPage::default());
    }

    #[test]
    fn chapters_without_parts_get_empty_track() {
        let html = r#"
            <section data-title="book-toc"><ol>
              <li data-test="chapter">
                <h4 class="c-card__title"><a href="/chapter/10.1/x_1">Solo</a></h4>
              </li>
            </ol></section>
        "#;
        let page = parse_book_page(html);
        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.entries[0].track, "");
        assert_eq!(page.entries[0].page_numbers, "");
    }

    #[test]
    fn chapter_page_details() {
        let html = r#"
            <section data-title="Abstract"><div>
              <p>We study   logs.</p><p>Second paragraph.</p>
            </div></section>
            <ol class="c-article-author-affiliation__list">
              <li><p class="c-article-author-affiliation__address">University of Porto, Porto, Portugal</p></li>
              <li><p class="c-article-author-affiliation__address">INESC TEC, Portugal</p></li>
              <li><p class="c-article-author-affiliation__address">TU Delft, Delft, Netherlands</p></li>
            </ol>
            <ul>
              <li class="c-article-subject-list__subject"><span>Web logs</span></li>
              <li class="c-article-subject-list__subject"><span> Mining </span></li>
            </ul>
        "#;
        let details = parse_chapter_page(html);
        assert_eq!(details.abstract_text.as_deref(), Some("We study logs."));
        assert_eq!(details.affiliations.len(), 3);
        assert_eq!(details.countries, vec!["Portugal", "Netherlands"]);
        assert_eq!(details.keywords, vec!["Web logs", "Mining"]);
    }

    #[test]
    fn chapter_page_missing_sections_are_empty() {
        let details = parse_chapter_page("<html><body><h1>Paywall</h1></body></html>");
        assert_eq!(details, ChapterDetails::default());
    }

    #[test]
    fn relative_links_resolve_against_base() {
        assert_eq!(
            absolute_url("https://link.springer.com", "/chapter/10.1/x").unwrap(),
            "https://link.springer.com/chapter/10.1/x"
        );
        assert_eq!(
            absolute_url("https://link.springer.com", "https://other.test/a").unwrap(),
            "https://other.test/a"
        );
    }
}
