//! GData-style YouTube client: ClientLogin, multipart/related uploads and
//! Atom playlist feeds.

use std::borrow::Cow;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use std::time::Duration;

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use reqwest::blocking::{Body, Client, RequestBuilder, Response};
use reqwest::header::CONTENT_TYPE;

use crate::config::Credentials;
use crate::error::{AppError, Result};

/// Category every upload is filed under.
pub const MUSIC_CATEGORY: &str = "Music";

const CATEGORY_SCHEME: &str = "http://gdata.youtube.com/schemas/2007/categories.cat";
const SOURCE: &str = "youtubegen";
const BOUNDARY: &str = "youtubegen_END_OF_PART";
const ATOM: &str = "application/atom+xml; charset=UTF-8";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    pub keywords: Option<String>,
    pub category: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistHandle {
    pub id: String,
    /// Feed that playlist entries are posted to.
    pub feed_url: String,
}

pub trait VideoHost {
    fn authenticate(&mut self, credentials: &Credentials) -> Result<()>;

    /// Upload `video` and return the new video's id.
    fn create_video_entry(&mut self, metadata: &VideoMetadata, video: &Path) -> Result<String>;

    fn create_playlist(&mut self, title: &str, description: &str) -> Result<PlaylistHandle>;

    fn add_video_to_playlist(&mut self, playlist: &PlaylistHandle, video_id: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub login: String,
    pub uploads: String,
    pub playlists: String,
    /// Base for playlist feeds when a created playlist omits its feed link.
    pub playlist_feeds: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: "https://www.google.com/accounts/ClientLogin".to_string(),
            uploads: "https://uploads.gdata.youtube.com/feeds/api/users/default/uploads".to_string(),
            playlists: "https://gdata.youtube.com/feeds/api/users/default/playlists".to_string(),
            playlist_feeds: "https://gdata.youtube.com/feeds/api/playlists".to_string(),
        }
    }
}

struct Session {
    token: String,
    developer_key: String,
}

pub struct YouTubeClient {
    http: Client,
    endpoints: Endpoints,
    session: Option<Session>,
}

impl YouTubeClient {
    pub fn new() -> Result<Self> {
        Self::with_endpoints(Endpoints::default())
    }

    pub fn with_endpoints(endpoints: Endpoints) -> Result<Self> {
        // Uploads can take far longer than any sensible request timeout.
        let http = Client::builder()
            .user_agent(concat!("youtubegen/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(30))
            .timeout(Option::<Duration>::None)
            .build()?;

        Ok(Self {
            http,
            endpoints,
            session: None,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let session = self.session.as_ref().ok_or(AppError::NotAuthenticated)?;
        Ok(request
            .header("Authorization", format!("GoogleLogin auth={}", session.token))
            .header("X-GData-Key", format!("key={}", session.developer_key))
            .header("GData-Version", "2"))
    }

    fn post_atom(&self, url: &str, entry: String) -> Result<String> {
        let request = self
            .http
            .post(url)
            .header(CONTENT_TYPE, ATOM)
            .body(entry);
        read_body(self.authorized(request)?.send()?)
    }
}

impl VideoHost for YouTubeClient {
    fn authenticate(&mut self, credentials: &Credentials) -> Result<()> {
        let response = self
            .http
            .post(&self.endpoints.login)
            .form(&[
                ("Email", credentials.email.as_str()),
                ("Passwd", credentials.password.as_str()),
                ("service", "youtube"),
                ("source", SOURCE),
                ("accountType", "HOSTED_OR_GOOGLE"),
            ])
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(AppError::AuthenticationFailed(body.trim().to_string()));
        }

        let token = parse_client_login(&body).ok_or_else(|| {
            AppError::AuthenticationFailed("response carried no Auth token".to_string())
        })?;

        tracing::info!(email = %credentials.email, "authenticated with video host");
        self.session = Some(Session {
            token,
            developer_key: credentials.developer_key.clone(),
        });
        Ok(())
    }

    fn create_video_entry(&mut self, metadata: &VideoMetadata, video: &Path) -> Result<String> {
        let file = File::open(video)?;
        let video_len = file.metadata()?.len();

        let head = format!(
            "--{BOUNDARY}\r\nContent-Type: {ATOM}\r\n\r\n{entry}\r\n--{BOUNDARY}\r\nContent-Type: {mime}\r\nContent-Transfer-Encoding: binary\r\n\r\n",
            entry = video_entry_xml(metadata),
            mime = video_mime(video),
        )
        .into_bytes();
        let tail = format!("\r\n--{BOUNDARY}--\r\n").into_bytes();
        let total = head.len() as u64 + video_len + tail.len() as u64;
        let body = Cursor::new(head).chain(file).chain(Cursor::new(tail));

        let slug = video
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let request = self
            .http
            .post(&self.endpoints.uploads)
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary=\"{BOUNDARY}\""),
            )
            .header("Slug", slug)
            .body(Body::sized(body, total));

        let response = read_body(self.authorized(request)?.send()?)?;
        let entry = parse_entry(&response)?;
        let id = entry
            .id
            .as_deref()
            .and_then(last_segment)
            .ok_or_else(|| AppError::Response("upload response has no video id".to_string()))?;

        tracing::debug!(video_id = id, path = %video.display(), "video uploaded");
        Ok(id.to_string())
    }

    fn create_playlist(&mut self, title: &str, description: &str) -> Result<PlaylistHandle> {
        let response = self.post_atom(&self.endpoints.playlists, playlist_entry_xml(title, description))?;
        let entry = parse_entry(&response)?;

        let id = entry
            .id
            .as_deref()
            .and_then(last_segment)
            .ok_or_else(|| AppError::Response("playlist response has no id".to_string()))?
            .to_string();
        let feed_url = entry
            .feed_link
            .unwrap_or_else(|| format!("{}/{id}", self.endpoints.playlist_feeds));

        Ok(PlaylistHandle { id, feed_url })
    }

    fn add_video_to_playlist(&mut self, playlist: &PlaylistHandle, video_id: &str) -> Result<()> {
        self.post_atom(&playlist.feed_url, playlist_video_xml(video_id))?;
        Ok(())
    }
}

fn read_body(response: Response) -> Result<String> {
    let status = response.status();
    let body = response.text()?;
    if !status.is_success() {
        return Err(AppError::Api {
            status: status.as_u16(),
            body: body.trim().to_string(),
        });
    }
    Ok(body)
}

/// `Auth=` value of a ClientLogin response.
fn parse_client_login(body: &str) -> Option<String> {
    body.lines()
        .find_map(|line| line.strip_prefix("Auth="))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Trailing segment of an Atom id (`tag:youtube.com,2008:video:ID` or a feed URL).
fn last_segment(id: &str) -> Option<&str> {
    id.trim()
        .rsplit(['/', ':'])
        .next()
        .filter(|segment| !segment.is_empty())
}

fn video_mime(video: &Path) -> &'static str {
    match video.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("flv") => "video/x-flv",
        Some(ext) if ext.eq_ignore_ascii_case("vob") => "video/mpeg",
        _ => "application/octet-stream",
    }
}

fn video_entry_xml(metadata: &VideoMetadata) -> String {
    let keywords = match &metadata.keywords {
        Some(keywords) => format!("<media:keywords>{}</media:keywords>", escape(keywords.as_str())),
        None => String::new(),
    };

    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>",
            "<entry xmlns=\"http://www.w3.org/2005/Atom\" ",
            "xmlns:media=\"http://search.yahoo.com/mrss/\" ",
            "xmlns:yt=\"http://gdata.youtube.com/schemas/2007\">",
            "<media:group>",
            "<media:title type=\"plain\">{title}</media:title>",
            "<media:description type=\"plain\">{description}</media:description>",
            "<media:category scheme=\"{scheme}\" label=\"{category}\">{category}</media:category>",
            "{keywords}",
            "</media:group>",
            "</entry>"
        ),
        title = escape(metadata.title.as_str()),
        description = escape(metadata.description.as_str()),
        scheme = CATEGORY_SCHEME,
        category = escape(metadata.category),
        keywords = keywords,
    )
}

fn playlist_entry_xml(title: &str, description: &str) -> String {
    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>",
            "<entry xmlns=\"http://www.w3.org/2005/Atom\" ",
            "xmlns:yt=\"http://gdata.youtube.com/schemas/2007\">",
            "<title type=\"text\">{}</title>",
            "<summary>{}</summary>",
            "</entry>"
        ),
        escape(title),
        escape(description),
    )
}

fn playlist_video_xml(video_id: &str) -> String {
    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>",
            "<entry xmlns=\"http://www.w3.org/2005/Atom\" ",
            "xmlns:yt=\"http://gdata.youtube.com/schemas/2007\">",
            "<id>{}</id>",
            "</entry>"
        ),
        escape(video_id),
    )
}

#[derive(Debug, Default, PartialEq, Eq)]
struct AtomEntry {
    id: Option<String>,
    feed_link: Option<String>,
}

fn parse_entry(xml: &str) -> Result<AtomEntry> {
    let malformed = |err: &dyn std::fmt::Display| AppError::Response(err.to_string());

    let mut reader = Reader::from_str(xml);
    let mut entry = AtomEntry::default();
    let mut in_id = false;

    loop {
        match reader.read_event().map_err(|e| malformed(&e))? {
            Event::Start(e) if e.local_name().as_ref() == b"id" => in_id = entry.id.is_none(),
            Event::Text(text) if in_id => {
                let value: Cow<'_, str> = text.unescape().map_err(|e| malformed(&e))?;
                entry.id = Some(value.trim().to_string());
                in_id = false;
            }
            Event::Start(e) | Event::Empty(e)
                if e.local_name().as_ref() == b"feedLink" && entry.feed_link.is_none() =>
            {
                if let Some(href) = e.try_get_attribute("href").map_err(|e| malformed(&e))? {
                    let href = href.unescape_value().map_err(|e| malformed(&e))?;
                    entry.feed_link = Some(href.into_owned());
                }
            }
            Event::End(_) => in_id = false,
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(keywords: Option<&str>) -> VideoMetadata {
        VideoMetadata {
            title: "Hüsker Dü - Diane & <Friends>".to_string(),
            description: "Recorded live".to_string(),
            keywords: keywords.map(str::to_string),
            category: MUSIC_CATEGORY,
        }
    }

    #[test]
    fn video_entry_escapes_text_and_files_under_music() {
        let xml = video_entry_xml(&metadata(Some("punk, hardcore")));

        assert!(xml.contains("<media:title type=\"plain\">Hüsker Dü - Diane &amp; &lt;Friends&gt;</media:title>"));
        assert!(xml.contains(">Music</media:category>"));
        assert!(xml.contains("<media:keywords>punk, hardcore</media:keywords>"));
        assert!(xml.contains("<media:description type=\"plain\">Recorded live</media:description>"));
    }

    #[test]
    fn video_entry_omits_missing_keywords() {
        assert!(!video_entry_xml(&metadata(None)).contains("media:keywords"));
    }

    #[test]
    fn parses_video_id_from_upload_response() {
        let xml = r#"<?xml version='1.0' encoding='UTF-8'?>
<entry xmlns='http://www.w3.org/2005/Atom' xmlns:yt='http://gdata.youtube.com/schemas/2007'>
  <id>tag:youtube.com,2008:video:dQw4w9WgXcQ</id>
  <author><name>someone</name><uri>http://gdata.youtube.com/feeds/api/users/someone</uri></author>
  <media:group xmlns:media='http://search.yahoo.com/mrss/'><yt:videoid>dQw4w9WgXcQ</yt:videoid></media:group>
</entry>"#;

        let entry = parse_entry(xml).unwrap();
        assert_eq!(entry.id.as_deref(), Some("tag:youtube.com,2008:video:dQw4w9WgXcQ"));
        assert_eq!(entry.id.as_deref().and_then(last_segment), Some("dQw4w9WgXcQ"));
    }

    #[test]
    fn parses_playlist_feed_link() {
        let xml = r#"<entry xmlns='http://www.w3.org/2005/Atom' xmlns:gd='http://schemas.google.com/g/2005'>
  <id>tag:youtube.com,2008:user:someone:playlist:PL8F6B0753B2CCA128</id>
  <gd:feedLink rel='http://gdata.youtube.com/schemas/2007#playlist' href='https://gdata.youtube.com/feeds/api/playlists/PL8F6B0753B2CCA128?v=2&amp;x=1' countHint='0'/>
</entry>"#;

        let entry = parse_entry(xml).unwrap();
        assert_eq!(entry.id.as_deref().and_then(last_segment), Some("PL8F6B0753B2CCA128"));
        assert_eq!(
            entry.feed_link.as_deref(),
            Some("https://gdata.youtube.com/feeds/api/playlists/PL8F6B0753B2CCA128?v=2&x=1")
        );
    }

    #[test]
    fn last_segment_handles_feed_urls() {
        assert_eq!(last_segment("http://gdata.youtube.com/feeds/api/videos/abc123"), Some("abc123"));
        assert_eq!(last_segment("tag:youtube.com,2008:video:"), None);
    }

    #[test]
    fn reads_client_login_token() {
        let body = "SID=aaa\nLSID=bbb\nAuth=token-123\n";
        assert_eq!(parse_client_login(body).as_deref(), Some("token-123"));
        assert_eq!(parse_client_login("Error=BadAuthentication\n"), None);
    }

    #[test]
    fn mime_follows_container() {
        assert_eq!(video_mime(Path::new("1.flv")), "video/x-flv");
        assert_eq!(video_mime(Path::new("1.VOB")), "video/mpeg");
        assert_eq!(video_mime(Path::new("1.bin")), "application/octet-stream");
    }

    #[test]
    fn requests_need_a_session() {
        let mut client = YouTubeClient::new().unwrap();
        let err = client
            .add_video_to_playlist(
                &PlaylistHandle {
                    id: "PL1".to_string(),
                    feed_url: "http://127.0.0.1:9/feed".to_string(),
                },
                "abc",
            )
            .unwrap_err();
        assert!(matches!(err, AppError::NotAuthenticated));
    }

    mod http {
        use super::super::*;
        use std::io::{BufRead, BufReader, Read, Write};
        use std::net::TcpListener;
        use std::thread::{self, JoinHandle};

        /// Answer one connection per canned `(status, body)` and hand back
        /// every raw request received.
        fn serve(responses: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<String>>) {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let base = format!("http://{}", listener.local_addr().unwrap());

            let handle = thread::spawn(move || {
                let mut requests = Vec::new();
                for (status, body) in responses {
                    let (mut stream, _) = listener.accept().unwrap();
                    let mut reader = BufReader::new(stream.try_clone().unwrap());

                    let mut head = String::new();
                    let mut content_length = 0;
                    loop {
                        let mut line = String::new();
                        reader.read_line(&mut line).unwrap();
                        if let Some((name, value)) = line.split_once(':') {
                            if name.eq_ignore_ascii_case("content-length") {
                                content_length = value.trim().parse().unwrap();
                            }
                        }
                        head.push_str(&line);
                        if line == "\r\n" || line.is_empty() {
                            break;
                        }
                    }
                    let mut payload = vec![0; content_length];
                    reader.read_exact(&mut payload).unwrap();
                    requests.push(head + &String::from_utf8_lossy(&payload));

                    write!(
                        stream,
                        "HTTP/1.1 {status} Stub\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    )
                    .unwrap();
                }
                requests
            });

            (base, handle)
        }

        fn client(base: &str) -> YouTubeClient {
            YouTubeClient {
                http: Client::builder().no_proxy().build().unwrap(),
                endpoints: Endpoints {
                    login: format!("{base}/login"),
                    uploads: format!("{base}/uploads"),
                    playlists: format!("{base}/playlists"),
                    playlist_feeds: format!("{base}/feeds"),
                },
                session: None,
            }
        }

        fn credentials() -> Credentials {
            Credentials {
                email: "me@example.com".to_string(),
                password: "pw".to_string(),
                developer_key: "devkey".to_string(),
            }
        }

        #[test]
        fn rejected_login_is_authentication_failure() {
            let (base, server) = serve(vec![(403, "Error=BadAuthentication\n")]);

            let err = client(&base).authenticate(&credentials()).unwrap_err();
            let requests = server.join().unwrap();

            assert!(matches!(&err, AppError::AuthenticationFailed(msg) if msg.contains("BadAuthentication")));
            assert!(requests[0].starts_with("POST /login HTTP/1.1"));
            assert!(requests[0].contains("Email=me%40example.com"));
            assert!(requests[0].contains("service=youtube"));
        }

        #[test]
        fn login_without_token_is_authentication_failure() {
            let (base, server) = serve(vec![(200, "SID=1\nLSID=2\n")]);

            let mut client = client(&base);
            let err = client.authenticate(&credentials()).unwrap_err();
            server.join().unwrap();

            assert!(matches!(err, AppError::AuthenticationFailed(_)));
            assert!(client.session.is_none());
        }

        #[test]
        fn upload_posts_multipart_entry_and_video() {
            let (base, server) = serve(vec![
                (200, "SID=1\nAuth=tok-1\n"),
                (
                    201,
                    "<entry xmlns='http://www.w3.org/2005/Atom'><id>tag:youtube.com,2008:video:abc123</id></entry>",
                ),
            ]);
            let dir = tempfile::tempdir().unwrap();
            let video = dir.path().join("1.vob");
            std::fs::write(&video, b"VIDEO-BYTES").unwrap();

            let mut client = client(&base);
            client.authenticate(&credentials()).unwrap();
            let meta = VideoMetadata {
                title: "Song".to_string(),
                description: "Desc".to_string(),
                keywords: None,
                category: MUSIC_CATEGORY,
            };
            let id = client.create_video_entry(&meta, &video).unwrap();
            let requests = server.join().unwrap();

            assert_eq!(id, "abc123");
            let upload = &requests[1];
            let headers = upload.to_ascii_lowercase();
            assert!(upload.starts_with("POST /uploads HTTP/1.1"));
            assert!(headers.contains("authorization: googlelogin auth=tok-1"));
            assert!(headers.contains("x-gdata-key: key=devkey"));
            assert!(headers.contains("gdata-version: 2"));
            assert!(headers.contains("slug: 1.vob"));
            assert!(headers.contains("content-type: multipart/related; boundary=\"youtubegen_end_of_part\""));
            assert!(upload.contains("<media:title type=\"plain\">Song</media:title>"));
            assert!(upload.contains("--youtubegen_END_OF_PART\r\nContent-Type: video/mpeg\r\n"));
            assert!(upload.ends_with("VIDEO-BYTES\r\n--youtubegen_END_OF_PART--\r\n"));
        }

        #[test]
        fn playlist_without_feed_link_falls_back_to_feed_base() {
            let (base, server) = serve(vec![
                (200, "Auth=tok\n"),
                (
                    201,
                    "<entry xmlns='http://www.w3.org/2005/Atom'><id>tag:youtube.com,2008:user:me:playlist:PL9</id></entry>",
                ),
                (201, "<entry xmlns='http://www.w3.org/2005/Atom'/>"),
            ]);

            let mut client = client(&base);
            client.authenticate(&credentials()).unwrap();
            let playlist = client.create_playlist("Wipers - Over the Edge", "desc").unwrap();
            client.add_video_to_playlist(&playlist, "abc123").unwrap();
            let requests = server.join().unwrap();

            assert_eq!(playlist.id, "PL9");
            assert_eq!(playlist.feed_url, format!("{base}/feeds/PL9"));
            assert!(requests[1].contains("<title type=\"text\">Wipers - Over the Edge</title>"));
            assert!(requests[2].starts_with("POST /feeds/PL9 HTTP/1.1"));
            assert!(requests[2].contains("<id>abc123</id>"));
        }

        #[test]
        fn error_status_is_reported_with_body() {
            let (base, server) = serve(vec![(200, "Auth=tok\n"), (500, "quota exceeded")]);

            let mut client = client(&base);
            client.authenticate(&credentials()).unwrap();
            let err = client.create_playlist("P", "").unwrap_err();
            server.join().unwrap();

            assert!(matches!(err, AppError::Api { status: 500, ref body } if body == "quota exceeded"));
        }
    }
}
