mod common;

use chrono::{TimeZone, Utc};
use rss_relay::{FeedParser, RelayError};

const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>Noticias</title>
    <link>https://news.example.com</link>
    <description>Portada</description>
    <item>
      <title>Pol&#237;tica &amp; econom&#237;a</title>
      <link>https://news.example.com/politica</link>
      <guid isPermaLink="false">news-1</guid>
      <pubDate>Fri, 15 Mar 2024 11:58:00 +0100</pubDate>
      <description><![CDATA[<p>La ciudad &amp; el <b>puerto</b> &eacute;xito</p>]]></description>
      <media:content url="https://img.example.com/a.jpg" medium="image"/>
    </item>
    <item>
      <title>Sin guid</title>
      <link>https://news.example.com/sin-guid</link>
      <pubDate>Fri, 15 Mar 2024 10:00:00 +0000</pubDate>
      <description>Texto breve.</description>
      <media:thumbnail url="https://img.example.com/thumb.jpg"/>
    </item>
    <item>
      <title>Sin fecha</title>
      <link>https://news.example.com/sin-fecha</link>
      <guid>news-3</guid>
    </item>
    <item>
      <title>Repetida</title>
      <link>https://news.example.com/politica-bis</link>
      <guid isPermaLink="false">news-1</guid>
    </item>
  </channel>
</rss>"#;

#[test]
fn test_parse_rss_items() {
    common::init_tracing();
    let items = FeedParser::new().parse_items(RSS).unwrap();

    assert_eq!(items.len(), 3);

    let first = &items[0];
    assert_eq!(first.identifier, "news-1");
    assert_eq!(first.title, "Política & economía");
    assert_eq!(first.summary_text, "La ciudad & el puerto éxito");
    assert_eq!(first.link, "https://news.example.com/politica");
    assert_eq!(first.published_at, Some(Utc.with_ymd_and_hms(2024, 3, 15, 10, 58, 0).unwrap()));
    assert_eq!(first.image_url.as_deref(), Some("https://img.example.com/a.jpg"));
}

#[test]
fn test_missing_guid_falls_back_to_link() {
    let items = FeedParser::new().parse_items(RSS).unwrap();

    let second = &items[1];
    assert_eq!(second.identifier, "https://news.example.com/sin-guid");
    assert_eq!(second.summary_text, "Texto breve.");
    assert_eq!(second.image_url.as_deref(), Some("https://img.example.com/thumb.jpg"));
}

#[test]
fn test_missing_date_is_kept_as_none() {
    let items = FeedParser::new().parse_items(RSS).unwrap();

    let third = &items[2];
    assert_eq!(third.identifier, "news-3");
    assert_eq!(third.published_at, None);
    assert_eq!(third.image_url, None);
}

#[test]
fn test_atom_updated_is_used_when_published_is_absent() {
    let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom</title>
  <id>urn:feed</id>
  <updated>2024-03-15T12:00:00+02:00</updated>
  <entry>
    <title>Entrada</title>
    <id>urn:entry:1</id>
    <link href="https://news.example.com/atom-1"/>
    <updated>2024-03-15T12:00:00+02:00</updated>
    <summary>Resumen.</summary>
  </entry>
</feed>"#;

    let items = FeedParser::new().parse_items(atom).unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].identifier, "urn:entry:1");
    assert_eq!(items[0].published_at, Some(Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap()));
}

#[test]
fn test_malformed_document_is_a_parse_error() {
    let result = FeedParser::new().parse_items("this is not a feed");
    assert!(matches!(result, Err(RelayError::Parse(_))));
}

#[test]
fn test_media_content_wins_over_thumbnail() {
    let rss = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>Noticias</title>
    <link>https://news.example.com</link>
    <description>Portada</description>
    <item>
      <title>Con dos imágenes</title>
      <link>https://news.example.com/dos</link>
      <guid>news-9</guid>
      <media:thumbnail url="https://img.example.com/thumb.jpg"/>
      <media:content url="https://img.example.com/content.jpg" medium="image"/>
    </item>
  </channel>
</rss>"#;

    let items = FeedParser::new().parse_items(rss).unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].image_url.as_deref(), Some("https://img.example.com/content.jpg"));
}
