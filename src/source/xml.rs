use std::fs;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::str;

use log::warn;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use xz::bufread::XzDecoder;

use crate::data::osm::{Element, ElementInfo, Node, Relation, Tags, Way};
use crate::errors::Result;
use crate::source::OsmSource;

/// OSM XML file source. Files ending in `.xz` are decompressed on the fly.
pub struct OsmXmlSource {
    path: PathBuf,
}

impl OsmXmlSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> OsmXmlSource {
        OsmXmlSource { path: path.into() }
    }
}

impl OsmSource for OsmXmlSource {
    type Stream = OsmXmlStream<Box<dyn BufRead>>;

    fn stream(&self) -> Result<Self::Stream> {
        let file = fs::File::open(&self.path)?;
        let file_reader = BufReader::new(file);
        let reader: Box<dyn BufRead> = if self.path.extension().map_or(false, |ext| ext == "xz") {
            Box::new(BufReader::new(XzDecoder::new(file_reader)))
        } else {
            Box::new(file_reader)
        };
        Ok(OsmXmlStream::new(Reader::from_reader(reader)))
    }
}

#[derive(Clone, Copy)]
enum XmlTag {
    Node,
    Way,
    Relation,
    Other,
}

fn xml_tag(name: &[u8]) -> XmlTag {
    match name {
        b"node" => XmlTag::Node,
        b"way" => XmlTag::Way,
        b"relation" => XmlTag::Relation,
        _ => XmlTag::Other,
    }
}

/// Pull parser turning OSM XML events into `Element` records. Elements with a
/// missing id (or a node with a missing coordinate) are skipped with a
/// warning; only a broken XML stream is an error.
pub struct OsmXmlStream<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
}

impl<R: BufRead> OsmXmlStream<R> {
    pub fn new(reader: Reader<R>) -> OsmXmlStream<R> {
        OsmXmlStream {
            reader,
            buf: Vec::new(),
        }
    }

    fn parse_node(el: &BytesStart) -> Option<Node> {
        let mut id: Option<u64> = None;
        let mut lat: Option<f64> = None;
        let mut lon: Option<f64> = None;

        for attribute_res in el.attributes() {
            let attribute = attribute_res.ok()?;
            match attribute.key.as_ref() {
                b"id" => {
                    let value_str = str::from_utf8(&attribute.value).ok()?;
                    id = Some(value_str.parse().ok()?);
                },
                b"lat" => {
                    let value_str = str::from_utf8(&attribute.value).ok()?;
                    lat = Some(value_str.parse().ok()?);
                },
                b"lon" => {
                    let value_str = str::from_utf8(&attribute.value).ok()?;
                    lon = Some(value_str.parse().ok()?);
                },
                _ => (),
            }
        }

        match (id, lat, lon) {
            (Some(id), Some(lat), Some(lon)) => Some(Node { id, lat, lon }),
            _ => {
                warn!("dropping node with a missing id or coordinate");
                None
            },
        }
    }

    fn parse_meta(el: &BytesStart) -> (Option<u64>, ElementInfo) {
        let mut id: Option<u64> = None;
        let mut info = ElementInfo::default();

        for attribute_res in el.attributes() {
            let Ok(attribute) = attribute_res else {
                continue;
            };
            let Ok(value_str) = str::from_utf8(&attribute.value) else {
                continue;
            };
            match attribute.key.as_ref() {
                b"id" => id = value_str.parse().ok(),
                b"version" => {
                    if let Ok(version) = value_str.parse() {
                        info.version = version;
                    }
                },
                b"changeset" => {
                    if let Ok(changeset) = value_str.parse() {
                        info.changeset = changeset;
                    }
                },
                b"timestamp" => info.timestamp = value_str.to_string(),
                _ => (),
            }
        }

        (id, info)
    }

    fn parse_nd_ref(el: &BytesStart) -> Result<Option<u64>> {
        for attribute_res in el.attributes() {
            let attribute = attribute_res?;
            if attribute.key.as_ref() == b"ref" {
                let value_str = str::from_utf8(&attribute.value)?;
                return Ok(value_str.parse().ok());
            }
        }
        Ok(None)
    }

    fn parse_tag(el: &BytesStart) -> Result<Option<(String, String)>> {
        let mut key: Option<String> = None;
        let mut value: Option<String> = None;

        for attribute_res in el.attributes() {
            let attribute = attribute_res?;
            match attribute.key.as_ref() {
                b"k" => key = Some(attribute.unescape_value()?.into_owned()),
                b"v" => value = Some(attribute.unescape_value()?.into_owned()),
                _ => (),
            }
        }

        Ok(key.zip(value))
    }

    /// Reads child events up to the matching end tag, collecting `nd` refs and
    /// `tag` pairs. Relation `member` entries are not modeled and fall through.
    fn read_body(&mut self, end: &[u8]) -> Result<(Vec<u64>, Tags)> {
        let mut node_refs: Vec<u64> = Vec::new();
        let mut tags = Tags::new();
        let mut body_buf = Vec::new();

        loop {
            body_buf.clear();
            match self.reader.read_event_into(&mut body_buf)? {
                Event::Start(el) | Event::Empty(el) => match el.name().as_ref() {
                    b"nd" => {
                        if let Some(node_ref) = Self::parse_nd_ref(&el)? {
                            node_refs.push(node_ref);
                        }
                    },
                    b"tag" => {
                        if let Some((key, value)) = Self::parse_tag(&el)? {
                            tags.insert(key, value);
                        }
                    },
                    _ => (),
                },
                Event::End(el) => {
                    if el.name().as_ref() == end {
                        break;
                    }
                },
                Event::Eof => return Err("unexpected end of file inside an element".into()),
                _ => (),
            }
        }

        Ok((node_refs, tags))
    }
}

impl<R: BufRead> Iterator for OsmXmlStream<R> {
    type Item = Result<Element>;

    fn next(&mut self) -> Option<Result<Element>> {
        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(err) => return Some(Err(err.into())),
            };
            match event {
                Event::Eof => return None,
                Event::Start(el) => {
                    // The tag kind is extracted first so the event's borrow of
                    // the buffer ends before the element body is read.
                    let tag = xml_tag(el.name().as_ref());
                    match tag {
                        // Child tags of nodes are not needed by any pass and
                        // are skipped by the outer loop.
                        XmlTag::Node => {
                            if let Some(node) = Self::parse_node(&el) {
                                return Some(Ok(Element::Node(node)));
                            }
                        },
                        XmlTag::Way => {
                            let (id, info) = Self::parse_meta(&el);
                            let (node_refs, tags) = match self.read_body(b"way") {
                                Ok(body) => body,
                                Err(err) => return Some(Err(err)),
                            };
                            match id {
                                Some(id) => {
                                    return Some(Ok(Element::Way(Way { id, node_refs, tags, info })))
                                },
                                None => warn!("dropping way without an id attribute"),
                            }
                        },
                        XmlTag::Relation => {
                            let (id, info) = Self::parse_meta(&el);
                            let (_, tags) = match self.read_body(b"relation") {
                                Ok(body) => body,
                                Err(err) => return Some(Err(err)),
                            };
                            match id {
                                Some(id) => {
                                    return Some(Ok(Element::Relation(Relation { id, tags, info })))
                                },
                                None => warn!("dropping relation without an id attribute"),
                            }
                        },
                        XmlTag::Other => (),
                    }
                },
                Event::Empty(el) => {
                    let tag = xml_tag(el.name().as_ref());
                    match tag {
                        XmlTag::Node => {
                            if let Some(node) = Self::parse_node(&el) {
                                return Some(Ok(Element::Node(node)));
                            }
                        },
                        XmlTag::Way => {
                            let (id, info) = Self::parse_meta(&el);
                            match id {
                                Some(id) => {
                                    return Some(Ok(Element::Way(Way {
                                        id,
                                        node_refs: Vec::new(),
                                        tags: Tags::new(),
                                        info,
                                    })))
                                },
                                None => warn!("dropping way without an id attribute"),
                            }
                        },
                        XmlTag::Relation => {
                            let (id, info) = Self::parse_meta(&el);
                            match id {
                                Some(id) => {
                                    return Some(Ok(Element::Relation(Relation {
                                        id,
                                        tags: Tags::new(),
                                        info,
                                    })))
                                },
                                None => warn!("dropping relation without an id attribute"),
                            }
                        },
                        XmlTag::Other => (),
                    }
                },
                _ => (),
            }
        }
    }
}
