//! ASCII outline of a roadmap, used in debug logs.

use crate::models::{NodeType, Roadmap, RoadmapNode};

fn type_symbol(node_type: NodeType) -> char {
    match node_type {
        NodeType::Root => '◎',
        NodeType::Category => '■',
        NodeType::Topic => '●',
        NodeType::Subtopic => '○',
        NodeType::Decision => '◇',
        NodeType::Resource => '•',
    }
}

/// Render a roadmap as an outline with one line per node.
///
/// ```text
/// Technology Careers
/// ├── ■ Web Development
/// │   └── ● Frontend Development *
/// └── ■ Cloud Computing
/// ```
///
/// Highlighted nodes carry a trailing `*`.
pub fn render_outline(tree: &Roadmap) -> String {
    let mut output = String::new();
    let root = tree.root();
    output.push_str(&root.title);
    output.push('\n');
    for (i, child) in root.children.iter().enumerate() {
        render_node(&mut output, child, "", i == root.children.len() - 1);
    }
    output
}

fn render_node(output: &mut String, node: &RoadmapNode, prefix: &str, is_last: bool) {
    output.push_str(prefix);
    output.push_str(if is_last { "└── " } else { "├── " });
    output.push(type_symbol(node.node_type));
    output.push(' ');
    output.push_str(&node.title);
    if node.highlight {
        output.push_str(" *");
    }
    output.push('\n');

    let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
    for (i, child) in node.children.iter().enumerate() {
        render_node(output, child, &child_prefix, i == node.children.len() - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_only() {
        let tree = Roadmap::root_only("root", "Technology Careers");
        assert_eq!(render_outline(&tree), "Technology Careers\n");
    }

    #[test]
    fn nested_branches_and_highlight() {
        let mut tree = Roadmap::root_only("root", "Technology Careers");
        tree.add_child("root", RoadmapNode::new("web", "Web Development", NodeType::Category))
            .unwrap();
        tree.add_child(
            "web",
            RoadmapNode::new("fe", "Frontend Development", NodeType::Topic).with_highlight(),
        )
        .unwrap();
        tree.add_child("web", RoadmapNode::new("or", "OR", NodeType::Decision))
            .unwrap();
        tree.add_child("root", RoadmapNode::new("cloud", "Cloud Computing", NodeType::Category))
            .unwrap();

        assert_eq!(
            render_outline(&tree),
            "Technology Careers\n\
             ├── ■ Web Development\n\
             │   ├── ● Frontend Development *\n\
             │   └── ◇ OR\n\
             └── ■ Cloud Computing\n"
        );
    }
}
