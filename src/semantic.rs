//! The Semantic builder (§4.7 / C7): walks `Trailer → /Root → /Pages` into
//! a flat page list, resolves inheritable page attributes, decodes page
//! labels, expands the outline tree, and flattens AcroForm fields.
//!
//! Unlike the Raw and Decoded tiers, the Semantic tier owns the graph it
//! exposes (§9 "back-references across tiers"): it holds the `Decoded`
//! document it was built from so extractors can still drop down to raw
//! bytes, but every field on `SemanticDocument` itself is already resolved.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::config::ScanLimits;
use crate::decode::DecodedDocument;
use crate::destinations::Destination;
use crate::document::decode_pdf_text_string;
use crate::error::ParseError;
use crate::object::{Dictionary, Object, ObjectId};
use crate::{Error, Result};

/// One flattened leaf of the page tree, with every inheritable attribute
/// already resolved by walking `/Parent` (§4.7 "Resolves inheritable
/// attributes").
#[derive(Debug, Clone)]
pub struct Page {
    pub id: ObjectId,
    pub media_box: Option<[f64; 4]>,
    pub crop_box: Option<[f64; 4]>,
    pub rotate: i64,
    pub resources: Option<ObjectId>,
}

/// A decoded `/PageLabels` Nums-tree entry, covering the five numbering
/// styles the PDF spec defines for `/S` (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLabelStyle {
    Decimal,
    UpperRoman,
    LowerRoman,
    UpperLetters,
    LowerLetters,
    /// No `/S` entry: only the prefix (if any) is used, no number appended.
    None,
}

/// One node of the outline (bookmark) tree (§4.7 "Outline trees").
#[derive(Debug, Clone)]
pub struct OutlineEntry {
    pub title: String,
    pub destination: Option<OutlineDestination>,
    pub children: Vec<OutlineEntry>,
}

/// Where an outline entry (or a named destination) points, resolved down
/// to a page reference and an (optional) view location array.
#[derive(Debug, Clone)]
pub struct OutlineDestination {
    pub page: ObjectId,
    pub params: Vec<Object>,
}

/// The kind-tagged terminal AcroForm field record §4.7 calls for: "Text /
/// Button / Choice / Signature / Generic".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Button,
    Choice,
    Signature,
    Generic,
}

/// A flattened terminal form field, with `/FT`, `/Ff`, and `/DA`
/// inheritance from ancestor field nodes already resolved.
#[derive(Debug, Clone)]
pub struct FormField {
    pub id: ObjectId,
    pub kind: FieldKind,
    pub flags: i64,
    pub default_appearance: Option<String>,
}

/// The Semantic tier (§3 "Semantic document"): the flattened page list,
/// page labels, outline tree, embedded-files name tree, and AcroForm,
/// plus a back-reference to the `Decoded` document it was built from.
pub struct SemanticDocument {
    pub decoded: DecodedDocument,
    pub pages: Vec<Page>,
    pub page_labels: HashMap<u32, String>,
    pub outlines: Vec<OutlineEntry>,
    pub named_destinations: IndexMap<Vec<u8>, Destination>,
    pub embedded_files: IndexMap<Vec<u8>, ObjectId>,
    pub form_fields: Vec<FormField>,
}

impl SemanticDocument {
    /// Builds the Semantic tier from an already-decoded document. Missing
    /// optional subtrees (outline, page labels, names, AcroForm) degrade
    /// silently; a missing catalog or page tree is fatal (§7 "Semantic
    /// build: missing optional subtrees ... degrade silently; missing
    /// required subtrees ... are fatal").
    pub fn build(decoded: DecodedDocument, limits: &ScanLimits) -> Result<Self> {
        let catalog_id = decoded
            .raw
            .trailer
            .get(b"Root")
            .and_then(Object::as_reference)
            .map_err(|_| Error::MissingCatalogEntry("Root"))?;
        let catalog = decoded.raw.get_dictionary(catalog_id)?;

        let pages_root = catalog
            .get(b"Pages")
            .and_then(Object::as_reference)
            .map_err(|_| Error::MissingCatalogEntry("Pages"))?;

        let max_depth = if limits.max_array_depth == 0 { 256 } else { limits.max_array_depth };
        let mut pages = Vec::new();
        let mut seen = std::collections::HashSet::new();
        let inherited = InheritedAttrs::default();
        flatten_pages(&decoded, pages_root, &inherited, &mut pages, &mut seen, max_depth)?;

        let page_labels = catalog
            .get(b"PageLabels")
            .ok()
            .and_then(|o| decoded.raw.dereference(o).ok())
            .map(|(_, o)| o)
            .and_then(|o| o.as_dict().ok())
            .map(|tree| decode_page_labels(&decoded, tree))
            .unwrap_or_default();

        let mut named_destinations = IndexMap::new();
        if let Ok(names) = catalog.get(b"Names").and_then(Object::as_dict) {
            if let Ok(dests) = names.get(b"Dests").and_then(Object::as_dict) {
                let _ = decoded.raw.get_named_destinations(dests, &mut named_destinations);
            }
        }

        let embedded_files = catalog
            .get(b"Names")
            .and_then(Object::as_dict)
            .ok()
            .and_then(|names| names.get(b"EmbeddedFiles").and_then(Object::as_dict).ok())
            .map(|tree| flatten_name_tree(&decoded, tree))
            .unwrap_or_default();

        let outlines = catalog
            .get(b"Outlines")
            .and_then(Object::as_reference)
            .ok()
            .and_then(|id| decoded.raw.get_dictionary(id).ok())
            .map(|root| build_outline_siblings(&decoded, root, &named_destinations, max_depth))
            .unwrap_or_default();

        let form_fields = catalog
            .get(b"AcroForm")
            .and_then(Object::as_reference)
            .ok()
            .and_then(|id| decoded.raw.get_dictionary(id).ok())
            .map(|acroform| flatten_form_fields(&decoded, acroform, max_depth))
            .unwrap_or_default();

        Ok(SemanticDocument { decoded, pages, page_labels, outlines, named_destinations, embedded_files, form_fields })
    }
}

#[derive(Default, Clone)]
struct InheritedAttrs {
    media_box: Option<[f64; 4]>,
    crop_box: Option<[f64; 4]>,
    rotate: Option<i64>,
    resources: Option<ObjectId>,
}

fn read_rect(dict: &Dictionary, key: &[u8]) -> Option<[f64; 4]> {
    let arr = dict.get(key).ok()?.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let mut out = [0.0; 4];
    for (i, v) in arr.iter().enumerate() {
        out[i] = v.as_f64().ok()?;
    }
    Some(out)
}

fn flatten_pages(
    decoded: &DecodedDocument, id: ObjectId, parent: &InheritedAttrs, pages: &mut Vec<Page>,
    seen: &mut std::collections::HashSet<ObjectId>, max_depth: usize,
) -> Result<()> {
    if !seen.insert(id) {
        return Err(Error::ReferenceCycle(id));
    }
    if seen.len() > max_depth {
        return Err(Error::ReferenceDepthExceeded(max_depth));
    }
    let dict = decoded.raw.get_dictionary(id)?;

    let node = InheritedAttrs {
        media_box: read_rect(dict, b"MediaBox").or(parent.media_box),
        crop_box: read_rect(dict, b"CropBox").or(parent.crop_box),
        rotate: dict.get(b"Rotate").and_then(Object::as_i64).ok().or(parent.rotate),
        resources: dict.get(b"Resources").and_then(Object::as_reference).ok().or(parent.resources),
    };

    match dict.get_type() {
        Ok(b"Pages") => {
            let kids = dict.get(b"Kids").and_then(Object::as_array).map_err(|_| ParseError::InvalidIndirectObject)?;
            for kid in kids {
                if let Ok(kid_ref) = kid.as_reference() {
                    flatten_pages(decoded, kid_ref, &node, pages, seen, max_depth)?;
                }
            }
        }
        // Some malformed documents omit /Type on page-tree intermediate
        // nodes; a node with /Kids is treated as /Pages regardless.
        _ if dict.has(b"Kids") => {
            let kids = dict.get(b"Kids").and_then(Object::as_array).map_err(|_| ParseError::InvalidIndirectObject)?;
            for kid in kids {
                if let Ok(kid_ref) = kid.as_reference() {
                    flatten_pages(decoded, kid_ref, &node, pages, seen, max_depth)?;
                }
            }
        }
        _ => {
            pages.push(Page {
                id,
                media_box: node.media_box,
                crop_box: node.crop_box,
                rotate: node.rotate.unwrap_or(0),
                resources: node.resources,
            });
        }
    }
    Ok(())
}

fn page_label_style(dict: &Dictionary) -> PageLabelStyle {
    match dict.get(b"S").and_then(Object::as_name) {
        Ok(b"D") => PageLabelStyle::Decimal,
        Ok(b"R") => PageLabelStyle::UpperRoman,
        Ok(b"r") => PageLabelStyle::LowerRoman,
        Ok(b"A") => PageLabelStyle::UpperLetters,
        Ok(b"a") => PageLabelStyle::LowerLetters,
        _ => PageLabelStyle::None,
    }
}

fn format_number(style: PageLabelStyle, n: u32) -> String {
    match style {
        PageLabelStyle::Decimal => n.to_string(),
        PageLabelStyle::UpperRoman => to_roman(n).to_uppercase(),
        PageLabelStyle::LowerRoman => to_roman(n),
        PageLabelStyle::UpperLetters => to_letters(n).to_uppercase(),
        PageLabelStyle::LowerLetters => to_letters(n),
        PageLabelStyle::None => String::new(),
    }
}

fn to_roman(mut n: u32) -> String {
    const VALUES: &[(u32, &str)] = &[
        (1000, "m"), (900, "cm"), (500, "d"), (400, "cd"), (100, "c"), (90, "xc"), (50, "l"), (40, "xl"),
        (10, "x"), (9, "ix"), (5, "v"), (4, "iv"), (1, "i"),
    ];
    if n == 0 {
        return String::new();
    }
    let mut out = String::new();
    for &(value, symbol) in VALUES {
        while n >= value {
            out.push_str(symbol);
            n -= value;
        }
    }
    out
}

/// The PDF spec's letter-style numbering: a, b, ..., z, aa, bb, ..., zz,
/// aaa, ... (the letter repeats, it does not become a base-26 string).
fn to_letters(n: u32) -> String {
    if n == 0 {
        return String::new();
    }
    let letter = (b'a' + ((n - 1) % 26) as u8) as char;
    let repeat = ((n - 1) / 26 + 1) as usize;
    std::iter::repeat(letter).take(repeat).collect()
}

fn decode_page_labels(decoded: &DecodedDocument, tree: &Dictionary) -> HashMap<u32, String> {
    let mut entries = Vec::new();
    collect_number_tree(decoded, tree, &mut entries, 0);
    entries.sort_by_key(|(start, _)| *start);

    let mut labels = HashMap::new();
    for (i, (start, label_dict)) in entries.iter().enumerate() {
        let next_start = entries.get(i + 1).map(|(s, _)| *s).unwrap_or(u32::MAX);
        let style = page_label_style(label_dict);
        let prefix = label_dict.get(b"P").and_then(Object::as_string).map(decode_pdf_text_string).unwrap_or_default();
        let first = label_dict.get(b"St").and_then(Object::as_i64).unwrap_or(1).max(1) as u32;

        let mut page_index = *start;
        let mut counter = first;
        while page_index < next_start {
            labels.insert(page_index, format!("{}{}", prefix, format_number(style, counter)));
            page_index += 1;
            counter += 1;
        }
    }
    labels
}

/// Walks a `/Nums`-or-`/Kids` number tree, collecting `(start-key, value
/// dict)` leaf pairs. Bounded by `depth` to survive cyclic `/Kids`.
fn collect_number_tree(decoded: &DecodedDocument, tree: &Dictionary, out: &mut Vec<(u32, Dictionary)>, depth: usize) {
    if depth > 64 {
        return;
    }
    if let Ok(nums) = tree.get(b"Nums").and_then(Object::as_array) {
        let mut it = nums.iter();
        while let (Some(key), Some(val)) = (it.next(), it.next()) {
            let Ok(key) = key.as_i64() else { continue };
            let dict = match val {
                Object::Dictionary(d) => Some(d.clone()),
                Object::Reference(id) => decoded.raw.get_dictionary(*id).ok().cloned(),
                _ => None,
            };
            if let Some(dict) = dict {
                out.push((key.max(0) as u32, dict));
            }
        }
    }
    if let Ok(kids) = tree.get(b"Kids").and_then(Object::as_array) {
        for kid in kids {
            if let Ok(id) = kid.as_reference() {
                if let Ok(kid_dict) = decoded.raw.get_dictionary(id) {
                    collect_number_tree(decoded, kid_dict, out, depth + 1);
                }
            }
        }
    }
}

fn flatten_name_tree(decoded: &DecodedDocument, tree: &Dictionary) -> IndexMap<Vec<u8>, ObjectId> {
    let mut out = IndexMap::new();
    collect_name_tree(decoded, tree, &mut out, 0);
    out
}

fn collect_name_tree(decoded: &DecodedDocument, tree: &Dictionary, out: &mut IndexMap<Vec<u8>, ObjectId>, depth: usize) {
    if depth > 64 {
        return;
    }
    if let Ok(names) = tree.get(b"Names").and_then(Object::as_array) {
        let mut it = names.iter();
        while let (Some(key), Some(val)) = (it.next(), it.next()) {
            let Ok(key) = key.as_str() else { continue };
            if let Ok(id) = val.as_reference() {
                out.insert(key.to_vec(), id);
            }
        }
    }
    if let Ok(kids) = tree.get(b"Kids").and_then(Object::as_array) {
        for kid in kids {
            if let Ok(id) = kid.as_reference() {
                if let Ok(kid_dict) = decoded.raw.get_dictionary(id) {
                    collect_name_tree(decoded, kid_dict, out, depth + 1);
                }
            }
        }
    }
}

fn resolve_outline_destination(
    decoded: &DecodedDocument, dict: &Dictionary, named: &IndexMap<Vec<u8>, Destination>,
) -> Option<OutlineDestination> {
    if let Ok(dest) = dict.get(b"Dest") {
        return destination_from_object(decoded, dest, named);
    }
    if let Ok(action) = dict.get(b"A").and_then(Object::as_dict) {
        if action.get(b"S").and_then(Object::as_name).ok() == Some(b"GoTo") {
            if let Ok(dest) = action.get(b"D") {
                return destination_from_object(decoded, dest, named);
            }
        }
    }
    None
}

fn destination_from_object(
    decoded: &DecodedDocument, dest: &Object, named: &IndexMap<Vec<u8>, Destination>,
) -> Option<OutlineDestination> {
    match dest {
        Object::Array(arr) if !arr.is_empty() => {
            let page = arr[0].as_reference().ok()?;
            Some(OutlineDestination { page, params: arr[1..].to_vec() })
        }
        Object::String(name, _) | Object::Name(name) => {
            let entry = named.get(name.as_slice())?;
            let page = entry.page().ok()?.as_reference().ok()?;
            Some(OutlineDestination { page, params: Vec::new() })
        }
        Object::Reference(id) => {
            let resolved = decoded.raw.get_object(*id).ok()?;
            destination_from_object(decoded, resolved, named)
        }
        _ => None,
    }
}

fn build_outline_siblings(
    decoded: &DecodedDocument, parent: &Dictionary, named: &IndexMap<Vec<u8>, Destination>, max_depth: usize,
) -> Vec<OutlineEntry> {
    let Ok(first) = parent.get(b"First").and_then(Object::as_reference) else { return Vec::new() };
    let mut entries = Vec::new();
    let mut current = Some(first);
    let mut seen = std::collections::HashSet::new();
    let mut depth = 0;

    while let Some(id) = current {
        if depth > max_depth || !seen.insert(id) {
            break;
        }
        depth += 1;
        let Ok(dict) = decoded.raw.get_dictionary(id) else { break };

        let title = dict
            .get(b"Title")
            .and_then(Object::as_string)
            .map(decode_pdf_text_string)
            .unwrap_or_default();
        let destination = resolve_outline_destination(decoded, dict, named);
        let children = build_outline_siblings(decoded, dict, named, max_depth.saturating_sub(1));

        entries.push(OutlineEntry { title, destination, children });
        current = dict.get(b"Next").and_then(Object::as_reference).ok();
    }
    entries
}

#[derive(Default, Clone)]
struct FieldInheritance {
    field_type: Option<Vec<u8>>,
    flags: Option<i64>,
    default_appearance: Option<String>,
}

fn field_kind(field_type: &Option<Vec<u8>>) -> FieldKind {
    match field_type.as_deref() {
        Some(b"Tx") => FieldKind::Text,
        Some(b"Btn") => FieldKind::Button,
        Some(b"Ch") => FieldKind::Choice,
        Some(b"Sig") => FieldKind::Signature,
        _ => FieldKind::Generic,
    }
}

fn flatten_form_fields(decoded: &DecodedDocument, acroform: &Dictionary, max_depth: usize) -> Vec<FormField> {
    let mut out = Vec::new();
    let Ok(fields) = acroform.get(b"Fields").and_then(Object::as_array) else { return out };
    let inherited = FieldInheritance::default();
    let mut seen = std::collections::HashSet::new();
    for field in fields {
        if let Ok(id) = field.as_reference() {
            collect_field(decoded, id, &inherited, &mut out, &mut seen, max_depth);
        }
    }
    out
}

fn collect_field(
    decoded: &DecodedDocument, id: ObjectId, parent: &FieldInheritance, out: &mut Vec<FormField>,
    seen: &mut std::collections::HashSet<ObjectId>, max_depth: usize,
) {
    if max_depth == 0 || !seen.insert(id) {
        return;
    }
    let Ok(dict) = decoded.raw.get_dictionary(id) else { return };

    let node = FieldInheritance {
        field_type: dict.get(b"FT").and_then(Object::as_name).ok().map(|n| n.to_vec()).or_else(|| parent.field_type.clone()),
        flags: dict.get(b"Ff").and_then(Object::as_i64).ok().or(parent.flags),
        default_appearance: dict
            .get(b"DA")
            .and_then(Object::as_string)
            .map(decode_pdf_text_string)
            .ok()
            .or_else(|| parent.default_appearance.clone()),
    };

    if let Ok(kids) = dict.get(b"Kids").and_then(Object::as_array) {
        // A field node with /Kids that are themselves field dictionaries
        // (carrying /FT, possibly inherited) is a non-terminal node;
        // widget-only kids (no /FT anywhere in the chain) are skipped.
        let mut had_field_kids = false;
        for kid in kids {
            if let Ok(kid_id) = kid.as_reference() {
                if decoded.raw.get_dictionary(kid_id).map(|d| d.has(b"FT") || node.field_type.is_some()).unwrap_or(false) {
                    had_field_kids = true;
                    collect_field(decoded, kid_id, &node, out, seen, max_depth - 1);
                }
            }
        }
        if had_field_kids {
            return;
        }
    }

    out.push(FormField {
        id,
        kind: field_kind(&node.field_type),
        flags: node.flags.unwrap_or(0),
        default_appearance: node.default_appearance,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DecodeParallelism, ResourceBudget};
    use crate::decode::{decode_document, CancellationToken};
    use crate::document::Document;
    use crate::object::Stream;

    fn build(raw: Document) -> SemanticDocument {
        let decoded = decode_document(
            raw,
            &ResourceBudget::default(),
            &DecodeParallelism::Fixed(1),
            &CancellationToken::new(),
        )
        .unwrap();
        SemanticDocument::build(decoded, &ScanLimits::default()).unwrap()
    }

    #[test]
    fn flattens_a_two_page_tree_with_inherited_media_box() {
        let mut doc = Document::new();
        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference((2, 0)));
        doc.objects.insert((1, 0), Object::Dictionary(catalog));

        let mut pages_root = Dictionary::new();
        pages_root.set("Type", Object::Name(b"Pages".to_vec()));
        pages_root.set("Kids", Object::Array(vec![Object::Reference((3, 0)), Object::Reference((4, 0))]));
        pages_root.set("MediaBox", Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]));
        doc.objects.insert((2, 0), Object::Dictionary(pages_root));

        let mut page1 = Dictionary::new();
        page1.set("Type", Object::Name(b"Page".to_vec()));
        page1.set("Parent", Object::Reference((2, 0)));
        doc.objects.insert((3, 0), Object::Dictionary(page1));

        let mut page2 = Dictionary::new();
        page2.set("Type", Object::Name(b"Page".to_vec()));
        page2.set("Parent", Object::Reference((2, 0)));
        page2.set("Rotate", Object::Integer(90));
        doc.objects.insert((4, 0), Object::Dictionary(page2));

        doc.trailer.set("Root", Object::Reference((1, 0)));

        let semantic = build(doc);
        assert_eq!(semantic.pages.len(), 2);
        assert_eq!(semantic.pages[0].media_box, Some([0.0, 0.0, 612.0, 792.0]));
        assert_eq!(semantic.pages[0].rotate, 0);
        assert_eq!(semantic.pages[1].rotate, 90);
        assert_eq!(semantic.pages[1].media_box, Some([0.0, 0.0, 612.0, 792.0]));
    }

    #[test]
    fn missing_root_is_fatal() {
        let doc = Document::new();
        let decoded = decode_document(
            doc,
            &ResourceBudget::default(),
            &DecodeParallelism::Fixed(1),
            &CancellationToken::new(),
        )
        .unwrap();
        assert!(SemanticDocument::build(decoded, &ScanLimits::default()).is_err());
    }

    #[test]
    fn decodes_decimal_page_labels_with_prefix() {
        let mut doc = Document::new();
        let mut catalog = Dictionary::new();
        catalog.set("Pages", Object::Reference((2, 0)));

        let mut label = Dictionary::new();
        label.set("S", Object::Name(b"D".to_vec()));
        label.set("P", Object::string_literal(b"A-".to_vec()));
        let mut label_tree = Dictionary::new();
        label_tree.set("Nums", Object::Array(vec![0.into(), Object::Dictionary(label)]));
        catalog.set("PageLabels", Object::Dictionary(label_tree));
        doc.objects.insert((1, 0), Object::Dictionary(catalog));

        let mut pages_root = Dictionary::new();
        pages_root.set("Type", Object::Name(b"Pages".to_vec()));
        pages_root.set("Kids", Object::Array(vec![Object::Reference((3, 0))]));
        doc.objects.insert((2, 0), Object::Dictionary(pages_root));

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        doc.objects.insert((3, 0), Object::Dictionary(page));

        doc.trailer.set("Root", Object::Reference((1, 0)));

        let semantic = build(doc);
        assert_eq!(semantic.page_labels.get(&0), Some(&"A-1".to_string()));
    }

    #[test]
    fn outline_chain_resolves_direct_array_destination() {
        let mut doc = Document::new();
        let mut catalog = Dictionary::new();
        catalog.set("Pages", Object::Reference((2, 0)));
        catalog.set("Outlines", Object::Reference((5, 0)));
        doc.objects.insert((1, 0), Object::Dictionary(catalog));

        let mut pages_root = Dictionary::new();
        pages_root.set("Type", Object::Name(b"Pages".to_vec()));
        pages_root.set("Kids", Object::Array(vec![Object::Reference((3, 0))]));
        doc.objects.insert((2, 0), Object::Dictionary(pages_root));

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        doc.objects.insert((3, 0), Object::Dictionary(page));

        let mut item = Dictionary::new();
        item.set("Title", Object::string_literal(b"Chapter 1".to_vec()));
        item.set("Dest", Object::Array(vec![Object::Reference((3, 0)), Object::Name(b"Fit".to_vec())]));
        doc.objects.insert((6, 0), Object::Dictionary(item));

        let mut outlines_root = Dictionary::new();
        outlines_root.set("First", Object::Reference((6, 0)));
        doc.objects.insert((5, 0), Object::Dictionary(outlines_root));

        doc.trailer.set("Root", Object::Reference((1, 0)));

        let semantic = build(doc);
        assert_eq!(semantic.outlines.len(), 1);
        assert_eq!(semantic.outlines[0].title, "Chapter 1");
        assert_eq!(semantic.outlines[0].destination.as_ref().unwrap().page, (3, 0));
    }

    #[test]
    fn terminal_field_inherits_field_type_from_parent() {
        let mut doc = Document::new();
        let mut catalog = Dictionary::new();
        catalog.set("Pages", Object::Reference((2, 0)));
        catalog.set("AcroForm", Object::Reference((10, 0)));
        doc.objects.insert((1, 0), Object::Dictionary(catalog));

        let mut pages_root = Dictionary::new();
        pages_root.set("Type", Object::Name(b"Pages".to_vec()));
        pages_root.set("Kids", Object::Array(vec![]));
        doc.objects.insert((2, 0), Object::Dictionary(pages_root));

        let mut kid = Dictionary::new();
        kid.set("T", Object::string_literal(b"name.first".to_vec()));
        doc.objects.insert((12, 0), Object::Dictionary(kid));

        let mut parent_field = Dictionary::new();
        parent_field.set("FT", Object::Name(b"Tx".to_vec()));
        parent_field.set("Kids", Object::Array(vec![Object::Reference((12, 0))]));
        doc.objects.insert((11, 0), Object::Dictionary(parent_field));

        let mut acroform = Dictionary::new();
        acroform.set("Fields", Object::Array(vec![Object::Reference((11, 0))]));
        doc.objects.insert((10, 0), Object::Dictionary(acroform));

        doc.trailer.set("Root", Object::Reference((1, 0)));

        let semantic = build(doc);
        assert_eq!(semantic.form_fields.len(), 1);
        assert_eq!(semantic.form_fields[0].id, (12, 0));
        assert_eq!(semantic.form_fields[0].kind, FieldKind::Text);
    }

    #[test]
    fn roman_and_letter_numbering_match_pdf_spec_examples() {
        assert_eq!(to_roman(1), "i");
        assert_eq!(to_roman(4), "iv");
        assert_eq!(to_roman(9), "ix");
        assert_eq!(to_letters(1), "a");
        assert_eq!(to_letters(26), "z");
        assert_eq!(to_letters(27), "aa");
    }

    #[test]
    fn stream_objects_are_unaffected_helper() {
        // A stray stream object in the directory should not confuse the
        // dictionary-typed walks above.
        let mut doc = Document::new();
        doc.objects.insert((9, 0), Object::Stream(Stream::new(Dictionary::new(), vec![])));
        assert!(doc.get_dictionary((9, 0)).is_ok());
    }
}
