use insta::assert_snapshot;

use optfilter::app::page::Page;
use optfilter::app::report::FilterReport;
use optfilter::infra::config::DiscoverySettings;

const DEMO: &str = include_str!("../assets/demo.html");

#[test]
fn plain_report_with_hidden_options() {
    let mut page = Page::from_markup(DEMO, DiscoverySettings::default()).unwrap();
    page.type_text("genre-search", "METAL").unwrap();

    let rendered = FilterReport::from_page(&page).to_plain(true);
    assert_snapshot!(rendered, @r"
    # genre-search -> genres (5/8 shown)
    - Rock
    + Metal
    + Death Metal
    + Groove Metal*
    + Thrash Metal
    + Black Metal
    - Hardcore
    - Grindcore
    # band-search -> bands (5/5 shown)
    + Pantera
    + Death
    + Cannibal Corpse
    + Anthrax
    + Dimmu Borgir
    ");
}

#[test]
fn plain_report_of_visible_options() {
    let mut page = Page::from_markup(DEMO, DiscoverySettings::default()).unwrap();
    page.type_text("genres", "core").unwrap();
    page.type_text("#1", "an").unwrap();

    let rendered = FilterReport::from_page(&page).to_plain(false);
    assert_snapshot!(rendered, @r"
    # genre-search -> genres (2/8 shown)
    Hardcore
    Grindcore
    # band-search -> bands (3/5 shown)
    Pantera
    Cannibal Corpse
    Anthrax
    ");
}
