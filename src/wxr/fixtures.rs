//! WXR snippets shared by tests

/// A complete export for `version` whose channel contains `body`
pub(crate) fn channel_with(version: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"
    xmlns:excerpt="http://wordpress.org/export/{v}/excerpt/"
    xmlns:content="http://purl.org/rss/1.0/modules/content/"
    xmlns:wfw="http://wellformedweb.org/CommentAPI/"
    xmlns:dc="http://purl.org/dc/elements/1.1/"
    xmlns:wp="http://wordpress.org/export/{v}/">
<channel>
    <title>Old Blog</title>
    <link>http://old.example.com</link>
    <wp:wxr_version>{v}</wp:wxr_version>
    {body}
</channel>
</rss>"#,
        v = version,
        body = body
    )
}

/// Alias of `channel_with` for documents made only of items
pub(crate) fn wxr_document(version: &str, items: &str) -> String {
    channel_with(version, items)
}

/// A published `post` item dated 2011-05-04 10:20:30 (08:20:30 GMT)
pub(crate) fn post_item(post_id: &str, title: &str, creator: &str, content: &str, extra: &str) -> String {
    item(post_id, title, creator, content, "publish", extra)
}

/// A `post` item with an explicit status
pub(crate) fn item(
    post_id: &str,
    title: &str,
    creator: &str,
    content: &str,
    status: &str,
    extra: &str,
) -> String {
    format!(
        r#"<item>
    <title>{title}</title>
    <dc:creator><![CDATA[{creator}]]></dc:creator>
    <content:encoded><![CDATA[{content}]]></content:encoded>
    <excerpt:encoded><![CDATA[]]></excerpt:encoded>
    <wp:post_id>{post_id}</wp:post_id>
    <wp:post_date>2011-05-04 10:20:30</wp:post_date>
    <wp:post_date_gmt>2011-05-04 08:20:30</wp:post_date_gmt>
    <wp:status>{status}</wp:status>
    <wp:post_type>post</wp:post_type>
    {extra}
</item>"#,
        title = title,
        creator = creator,
        content = content,
        post_id = post_id,
        status = status,
        extra = extra
    )
}

/// An `attachment` item
pub(crate) fn attachment_item(post_id: &str, title: &str, url: &str) -> String {
    format!(
        r#"<item>
    <title>{title}</title>
    <dc:creator><![CDATA[admin]]></dc:creator>
    <content:encoded><![CDATA[]]></content:encoded>
    <wp:post_id>{post_id}</wp:post_id>
    <wp:post_type>attachment</wp:post_type>
    <wp:attachment_url>{url}</wp:attachment_url>
</item>"#,
        title = title,
        post_id = post_id,
        url = url
    )
}

/// A channel-level `<wp:category>`
pub(crate) fn category(name: &str, nicename: &str, parent: &str) -> String {
    format!(
        r#"<wp:category>
    <wp:category_nicename>{nicename}</wp:category_nicename>
    <wp:category_parent>{parent}</wp:category_parent>
    <wp:cat_name><![CDATA[{name}]]></wp:cat_name>
</wp:category>"#,
        name = name,
        nicename = nicename,
        parent = parent
    )
}
