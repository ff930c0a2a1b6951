//! Parser and writer for the jplace Newick dialect.
//!
//! Supports branch lengths and the `{edge_num}` brace annotation that
//! placements reference, e.g. `((A:0.1{0},B:0.2{1}):0.3{2},C:0.4{3});`.
//! Quoting, comments and other Nexus extras are out of scope.

use crate::errors::{PlaceError, PlaceResult};
use crate::tree::arena::{EdgeIndex, NodeIndex, PlacementTree};
use crate::tree::traversal::reset_edge_nums;

/// Parses a Newick string into a tree.
///
/// If brace annotations are present they must cover every edge and form a
/// dense permutation of [0, edge_count). A brace on the outermost clade
/// (a root "edge" with nothing above it) is parsed and ignored. Without
/// braces, post-order numbers are assigned.
pub fn parse(input: &str) -> PlaceResult<PlacementTree> {
    let mut parser = Parser {
        bytes: input.as_bytes(),
        pos: 0,
    };
    let mut tree = PlacementTree::new();
    let mut records: Vec<(EdgeIndex, Option<usize>)> = Vec::new();

    parser.skip_ws();
    let root = parser.subtree(&mut tree, &mut records)?;
    // the root carries no edge above it; its suffix is tolerated and dropped
    let _ = parser.suffix()?;
    parser.skip_ws();
    parser.expect(b';')?;
    parser.skip_ws();
    if parser.pos != parser.bytes.len() {
        return Err(PlaceError::InvalidNewick(format!(
            "trailing content after ';' at byte {}",
            parser.pos
        )));
    }
    tree.set_root(root);

    finalize_edge_nums(&mut tree, &records)?;
    Ok(tree)
}

/// Serializes the tree back to Newick with `{edge_num}` annotations.
pub fn write(tree: &PlacementTree) -> String {
    let mut out = String::new();
    if let Some(root) = tree.root() {
        write_clade(tree, root, None, &mut out);
    }
    out.push(';');
    out
}

fn finalize_edge_nums(
    tree: &mut PlacementTree,
    records: &[(EdgeIndex, Option<usize>)],
) -> PlaceResult<()> {
    let annotated = records.iter().filter(|(_, num)| num.is_some()).count();
    if annotated == 0 {
        reset_edge_nums(tree);
        return Ok(());
    }
    if annotated != records.len() {
        return Err(PlaceError::InvalidNewick(
            "some edges carry {edge_num} annotations and some do not".into(),
        ));
    }
    for &(edge_idx, num) in records {
        if let (Some(edge), Some(num)) = (tree.edge_mut(edge_idx), num) {
            edge.edge_num = num;
        }
    }
    if !tree.has_dense_edge_nums() {
        return Err(PlaceError::InvalidEdgeNumbering {
            expected: tree.edge_count(),
            reason: "duplicate or out-of-range {edge_num} annotation".into(),
        });
    }
    Ok(())
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, wanted: u8) -> PlaceResult<()> {
        match self.peek() {
            Some(b) if b == wanted => {
                self.pos += 1;
                Ok(())
            }
            found => Err(PlaceError::InvalidNewick(format!(
                "expected '{}' at byte {}, found {:?}",
                wanted as char,
                self.pos,
                found.map(|b| b as char)
            ))),
        }
    }

    fn subtree(
        &mut self,
        tree: &mut PlacementTree,
        records: &mut Vec<(EdgeIndex, Option<usize>)>,
    ) -> PlaceResult<NodeIndex> {
        self.skip_ws();
        if self.peek() == Some(b'(') {
            self.pos += 1;
            let mut children = Vec::new();
            loop {
                let child = self.subtree(tree, records)?;
                let (branch_length, edge_num) = self.suffix()?;
                children.push((child, branch_length, edge_num));
                self.skip_ws();
                match self.peek() {
                    Some(b',') => {
                        self.pos += 1;
                    }
                    Some(b')') => {
                        self.pos += 1;
                        break;
                    }
                    found => {
                        return Err(PlaceError::InvalidNewick(format!(
                            "expected ',' or ')' at byte {}, found {:?}",
                            self.pos,
                            found.map(|b| b as char)
                        )));
                    }
                }
            }
            let label = self.label();
            let node = tree.insert_node(label);
            for (child, branch_length, edge_num) in children {
                let edge = tree.connect(node, child, branch_length, edge_num.unwrap_or(0));
                records.push((edge, edge_num));
            }
            Ok(node)
        } else {
            let label = self.label();
            if label.is_empty() {
                return Err(PlaceError::InvalidNewick(format!(
                    "expected a taxon label at byte {}",
                    self.pos
                )));
            }
            Ok(tree.insert_node(label))
        }
    }

    fn label(&mut self) -> String {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() || matches!(b, b'(' | b')' | b',' | b':' | b';' | b'{' | b'}')
            {
                break;
            }
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned()
    }

    /// `:length` and `{edge_num}` after a clade, both optional.
    fn suffix(&mut self) -> PlaceResult<(f64, Option<usize>)> {
        self.skip_ws();
        let mut branch_length = 0.0;
        if self.peek() == Some(b':') {
            self.pos += 1;
            branch_length = self.number()?;
        }
        let mut edge_num = None;
        self.skip_ws();
        if self.peek() == Some(b'{') {
            self.pos += 1;
            let num = self.number()?;
            self.expect(b'}')?;
            if num < 0.0 || num.fract() != 0.0 {
                return Err(PlaceError::InvalidNewick(format!(
                    "edge number {num} is not a non-negative integer"
                )));
            }
            edge_num = Some(num as usize);
        }
        Ok((branch_length, edge_num))
    }

    fn number(&mut self) -> PlaceResult<f64> {
        let start = self.pos;
        while matches!(
            self.peek(),
            Some(b'0'..=b'9' | b'.' | b'+' | b'-' | b'e' | b'E')
        ) {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.bytes[start..self.pos]).unwrap_or("");
        text.parse::<f64>().map_err(|_| {
            PlaceError::InvalidNewick(format!("invalid number '{text}' at byte {start}"))
        })
    }
}

fn write_clade(tree: &PlacementTree, node_idx: NodeIndex, via: Option<EdgeIndex>, out: &mut String) {
    let Some(node) = tree.node(node_idx) else {
        return;
    };
    let children: Vec<EdgeIndex> = node
        .edges
        .iter()
        .copied()
        .filter(|&e| Some(e) != via)
        .collect();
    if !children.is_empty() {
        out.push('(');
        for (i, &edge) in children.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            if let Some(child) = tree.other_end(edge, node_idx) {
                write_clade(tree, child, Some(edge), out);
            }
        }
        out.push(')');
    }
    out.push_str(&node.name);
    if let Some(edge_idx) = via {
        if let Some(edge) = tree.edge(edge_idx) {
            out.push_str(&format!(":{}{{{}}}", edge.branch_length, edge.edge_num));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_annotated_newick_when_parsing_then_edge_nums_are_kept() {
        let tree = parse("((A:0.1{0},B:0.2{1}):0.3{2},C:0.4{3},D:0.5{4});").unwrap();
        assert_eq!(tree.leaf_count(), 4);
        assert_eq!(tree.edge_count(), 5);
        assert!(tree.has_dense_edge_nums());

        let leaf = tree.find_leaf("B").unwrap();
        let node = tree.node(leaf).unwrap();
        let edge = tree.edge(node.edges[0]).unwrap();
        assert_eq!(edge.edge_num, 1);
        assert!((edge.branch_length - 0.2).abs() < 1e-12);
    }

    #[test]
    fn given_plain_newick_when_parsing_then_postorder_nums_are_assigned() {
        let tree = parse("((A:0.1,B:0.2):0.3,C:0.4,D:0.5);").unwrap();
        assert_eq!(tree.edge_count(), 5);
        assert!(tree.has_dense_edge_nums());
    }

    #[test]
    fn given_duplicate_edge_nums_when_parsing_then_fails() {
        let result = parse("((A:0.1{0},B:0.2{0}):0.3{2},C:0.4{3},D:0.5{4});");
        assert!(matches!(
            result,
            Err(PlaceError::InvalidEdgeNumbering { .. })
        ));
    }

    #[test]
    fn given_parsed_tree_when_writing_then_roundtrips() {
        let input = "((A:0.1{0},B:0.2{1}):0.3{2},C:0.4{3},D:0.5{4});";
        let tree = parse(input).unwrap();
        let output = write(&tree);
        let reparsed = parse(&output).unwrap();
        assert_eq!(reparsed.edge_count(), tree.edge_count());
        assert_eq!(reparsed.leaf_names(), tree.leaf_names());
    }
}
