//! Entry body rewriting
//!
//! Images hosted on the source blog are rehosted and replaced by embed
//! placeholders. The body is parsed twice: once to collect candidates before
//! any download, once to splice in the embeds after every download finished,
//! so no parsed tree lives across an await point.

use std::collections::HashMap;

use ego_tree::NodeId;
use scraper::node::Text;
use scraper::{Html, Node};
use uuid::Uuid;

use crate::services::text::{truncate_chars, MAX_FIELD_LENGTH};

use super::images::ImageRehoster;

/// Path fragment every WordPress.com upload URL contains
const FILES_MARKER: &str = "files";

/// An `<img>` worth rehosting and the link wrapping it, if any
#[derive(Debug, Clone, PartialEq)]
struct Candidate {
    image: NodeId,
    wrapper: Option<NodeId>,
    src: String,
    title: String,
}

pub struct ContentRewriter<'a> {
    rehoster: &'a ImageRehoster,
    marker: &'a str,
}

impl<'a> ContentRewriter<'a> {
    /// `marker` is the upload path fragment of the source site, like `wp-content`
    pub fn new(rehoster: &'a ImageRehoster, marker: &'a str) -> Self {
        Self { rehoster, marker }
    }

    /// Rehost qualifying images of `html` and return the rewritten body.
    ///
    /// Images that fail to download keep their original markup. When nothing
    /// was replaced the input is returned unchanged.
    pub async fn rewrite(&self, html: &str) -> String {
        if html.trim().is_empty() {
            return html.to_string();
        }

        let candidates = find_candidates(html, self.marker);
        if candidates.is_empty() {
            return html.to_string();
        }

        let mut rehosted = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let embed = self
                .rehoster
                .rehost(&candidate.src, &candidate.title)
                .await
                .map(|image| image.embed_tag());
            rehosted.push((candidate, embed));
        }

        let (order, embeds) = plan_embeds(&rehosted);
        if embeds.is_empty() {
            return html.to_string();
        }

        splice_embeds(html, &order, &embeds)
    }
}

/// Decide which node each successful embed replaces.
///
/// A link is replaced as a whole only when every image inside it was
/// rehosted. Otherwise each rehosted image is replaced on its own and the
/// link keeps the images that failed.
fn plan_embeds(rehosted: &[(Candidate, Option<String>)]) -> (Vec<NodeId>, HashMap<NodeId, Vec<String>>) {
    let mut complete: HashMap<NodeId, bool> = HashMap::new();
    for (candidate, embed) in rehosted {
        if let Some(wrapper) = candidate.wrapper {
            *complete.entry(wrapper).or_insert(true) &= embed.is_some();
        }
    }

    let mut embeds: HashMap<NodeId, Vec<String>> = HashMap::new();
    let mut order = Vec::new();
    for (candidate, embed) in rehosted {
        let Some(embed) = embed else {
            continue;
        };
        let target = match candidate.wrapper {
            Some(wrapper) if complete.get(&wrapper).copied().unwrap_or(false) => wrapper,
            _ => candidate.image,
        };
        if !embeds.contains_key(&target) {
            order.push(target);
        }
        embeds.entry(target).or_default().push(embed.clone());
    }

    (order, embeds)
}

fn find_candidates(html: &str, marker: &str) -> Vec<Candidate> {
    let fragment = Html::parse_fragment(html);
    let mut candidates = Vec::new();

    for node in fragment.root_element().descendants() {
        let Node::Element(element) = node.value() else {
            continue;
        };
        if element.name() != "img" {
            continue;
        }
        let Some(src) = element.attr("src") else {
            continue;
        };
        let qualifies = src.contains(FILES_MARKER) || (!marker.is_empty() && src.contains(marker));
        if !qualifies {
            continue;
        }

        let wrapper = node
            .parent()
            .filter(|p| matches!(p.value(), Node::Element(e) if e.name() == "a"));
        let title = element
            .attr("title")
            .or_else(|| element.attr("alt"))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| title_from_url(src));

        candidates.push(Candidate {
            image: node.id(),
            wrapper: wrapper.map(|w| w.id()),
            src: src.to_string(),
            title: truncate_chars(&title, MAX_FIELD_LENGTH),
        });
    }

    candidates
}

/// Last path segment of `src`, or `image`
fn title_from_url(src: &str) -> String {
    let path = match url::Url::parse(src) {
        Ok(url) => url.path().to_string(),
        Err(_) => src.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or("image")
        .to_string()
}

/// Re-parse `html`, replace each target node by its embeds and serialize.
///
/// Parsing is deterministic, so node ids collected by `find_candidates` still
/// point at the same nodes.
fn splice_embeds(html: &str, order: &[NodeId], embeds: &HashMap<NodeId, Vec<String>>) -> String {
    let mut fragment = Html::parse_fragment(html);
    let mut tokens: Vec<(String, &str)> = Vec::new();

    for id in order {
        let Some(tags) = embeds.get(id) else {
            continue;
        };
        let Some(mut node) = fragment.tree.get_mut(*id) else {
            continue;
        };
        if node.parent().is_none() {
            continue;
        }
        for tag in tags {
            let token = format!("noteva-embed-{}", Uuid::new_v4().simple());
            node.insert_before(Node::Text(Text {
                text: token.as_str().into(),
            }));
            tokens.push((token, tag.as_str()));
        }
        node.detach();
    }

    let mut output = fragment.root_element().inner_html();
    for (token, tag) in tokens {
        output = output.replace(&token, tag);
    }
    output
}
