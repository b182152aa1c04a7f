use clap::Args;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::core::extract::{SidebarExtractor, SkipReason};
use crate::core::page::Page;
use crate::error::{PageError, Result};
use crate::services::SimpleServices;

#[derive(Args)]
pub struct ExtractArgs {
    /// Page showing the track (URL or saved HTML snapshot)
    #[arg(value_name = "PAGE")]
    page: String,

    /// Use this genre instead of the one in the artist's genre link
    #[arg(long)]
    genre: Option<String>,

    /// Write the statement to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn execute(args: ExtractArgs, services: &SimpleServices) -> Result<()> {
    let page = services.open_page(&args.page).await?;
    let extractor = services.create_extractor().with_genre_override(args.genre);

    let statement = extract_statement(&page, &extractor)?;
    super::emit(args.output.as_deref(), &format!("{}\n", statement))
}

/// One insert statement for the current track. Empty fields are reported
/// but the statement is still produced.
pub fn extract_statement(page: &dyn Page, extractor: &SidebarExtractor) -> std::result::Result<String, PageError> {
    let song = extractor.extract(page)?;

    let missing = song.missing_fields();
    if !missing.is_empty() {
        warn!("{}", SkipReason::EmptyFields { fields: missing });
    }

    info!("Extracted '{}' by '{}' ({}, {})", song.title, song.artist, song.lang, song.genre);
    Ok(song.to_insert_sql())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Selectors;
    use crate::core::page::source::MemorySource;
    use crate::core::page::DocumentPage;
    use url::Url;

    fn extractor() -> SidebarExtractor {
        SidebarExtractor::new(Selectors::default(), "alternative_rock".to_string(), "/genre/".to_string())
    }

    async fn page(html: &str) -> DocumentPage<MemorySource> {
        let source = MemorySource::new().with_page("http://site.test/album/1/track/2", html);
        DocumentPage::open(source, Url::parse("http://site.test/album/1/track/2").unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_single_track_statement() {
        let page = page(r#"
            <div class="sidebar-track">
                <div class="sidebar-track__title"><a>Don't Look Back</a></div>
                <div class="album-summary__pregroup"><a>The Band</a></div>
                <div class="sidebar-track__lyric-preview">one
two</div>
            </div>"#).await;

        let sql = extract_statement(&page, &extractor()).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO `songs` (`artist`, `title`, `lyrics`, `lang`, `genre`) VALUES ('The Band', 'Don\\'t Look Back', 'one\\ntwo', 'en', 'alternative_rock');"
        );
    }

    #[tokio::test]
    async fn test_empty_fields_still_emit() {
        let page = page("<p>nothing playing</p>").await;
        let sql = extract_statement(&page, &extractor()).unwrap();
        assert!(sql.ends_with("VALUES ('', '', '', 'en', 'alternative_rock');"));
    }
}
