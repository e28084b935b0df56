//! Terminal renderers for the committed render model.
//!
//! [`TextSink`] prints each node as a card in an indented outline, one level
//! of indentation per tree level, in layout order. The newest node is marked
//! with `*` and a `recording history...` cue while the request is running.
//! [`JsonSink`] writes the nodes and edges exactly as the presentation layer
//! would receive them.

use std::io::{self, Write};

use clap::ValueEnum;
use pivot::{
    PivotActor, PivotDecision, PivotNode, PivotRamification, RenderEdge, RenderNode, RenderSink,
};
use serde::Serialize;

/// Cue shown next to the newest node.
pub const NEWEST_CUE: &str = "recording history...";

const INDENT: &str = "  ";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Build the sink for `format` over `out`.
///
/// `show_cue` only affects the text outline.
pub fn sink_for<'a, W: Write + 'a>(
    format: OutputFormat,
    out: W,
    show_cue: bool,
) -> Box<dyn RenderSink + 'a> {
    match format {
        OutputFormat::Text if show_cue => Box::new(TextSink::new(out)),
        OutputFormat::Text => Box::new(TextSink::new(out).without_cue()),
        OutputFormat::Json => Box::new(JsonSink::new(out)),
    }
}

// ---------------------------------------------------------------------------
// Text outline
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct TextSink<W> {
    out: W,
    show_cue: bool,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            show_cue: true,
        }
    }

    /// Hide the newest-node cue, e.g. once generation has finished.
    #[must_use]
    pub fn without_cue(mut self) -> Self {
        self.show_cue = false;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_node(&mut self, node: &RenderNode) -> io::Result<()> {
        let depth = depth_of(node);
        let pad = INDENT.repeat(depth);
        let detail = INDENT.repeat(depth + 2);
        let content = node.content();
        let marker = if self.show_cue && node.is_newest() { '*' } else { '-' };

        if content.is_placeholder() {
            writeln!(self.out, "{pad}{marker} [{}] (pending)", node.id)?;
            return Ok(());
        }

        write!(self.out, "{pad}{marker} [{}] {}: {}", node.id, content.year, content.description)?;
        if self.show_cue && node.is_newest() {
            write!(self.out, "  ({NEWEST_CUE})")?;
        }
        writeln!(self.out)?;

        if !content.actors.is_empty() {
            let actors: Vec<String> = content.actors.iter().map(describe_actor).collect();
            writeln!(self.out, "{detail}actors: {}", actors.join(", "))?;
            for actor in &content.actors {
                for relationship in actor.relationships.iter().flatten() {
                    writeln!(
                        self.out,
                        "{detail}{INDENT}{} -> {}: {} ({:.2})",
                        actor.name,
                        relationship.target.name,
                        relationship.relationship_type,
                        relationship.strength
                    )?;
                }
            }
        }

        for decision in &content.possible_outcomes {
            self.write_decision(&detail, decision)?;
        }

        for narrative in content.narratives.iter().flatten() {
            writeln!(self.out, "{detail}{}: {}", narrative.viewpoint, narrative.text)?;
        }
        Ok(())
    }

    fn write_decision(&mut self, detail: &str, decision: &PivotDecision) -> io::Result<()> {
        let actor = if decision.actor.name.is_empty() {
            "Loading"
        } else {
            decision.actor.name.as_str()
        };
        writeln!(self.out, "{detail}outcome: {actor}: {}", decision.action)?;
        for ramification in &decision.short_term_ramifications {
            writeln!(self.out, "{detail}{INDENT}short: {}", describe_ramification(ramification))?;
        }
        for ramification in &decision.long_term_ramifications {
            writeln!(self.out, "{detail}{INDENT}long: {}", describe_ramification(ramification))?;
        }
        Ok(())
    }
}

impl<W: Write> RenderSink for TextSink<W> {
    fn render(&mut self, nodes: &[RenderNode], edges: &[RenderEdge]) -> io::Result<()> {
        writeln!(self.out, "{} nodes, {} edges", nodes.len(), edges.len())?;
        for node in nodes {
            self.write_node(node)?;
        }
        self.out.flush()
    }
}

fn depth_of(node: &RenderNode) -> usize {
    if node.id.is_root() {
        0
    } else {
        node.id.as_str().split('-').count()
    }
}

fn describe_actor(actor: &PivotActor) -> String {
    let kind = actor.kind.as_str();
    if kind.is_empty() {
        actor.name.clone()
    } else {
        format!("{} ({kind})", actor.name)
    }
}

fn describe_ramification(ramification: &PivotRamification) -> String {
    let mut line = format!("{}: {}", ramification.affected_actor.name, ramification.ramification);
    if let Some(probability) = ramification.probability {
        line.push_str(&format!(" [p={probability:.2}]"));
    }
    line
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct JsonSink<W> {
    out: W,
}

#[derive(Serialize)]
struct JsonModel<'a> {
    nodes: &'a [RenderNode],
    edges: &'a [RenderEdge],
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RenderSink for JsonSink<W> {
    fn render(&mut self, nodes: &[RenderNode], edges: &[RenderEdge]) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut self.out, &JsonModel { nodes, edges })?;
        writeln!(self.out)?;
        self.out.flush()
    }
}

/// One-line summary of a node for log fields.
pub fn summarize(node: &PivotNode) -> String {
    if node.is_placeholder() {
        "(pending)".to_string()
    } else {
        format!("{}: {}", node.year, node.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pivot::{LayoutEngine, PositionCache};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn sample_nodes() -> Vec<RenderNode> {
        let root: PivotNode = serde_json::from_value(serde_json::json!({
            "year": "476",
            "description": "Romulus Augustulus is deposed",
            "actors": [
                {"type": "person", "name": "Odoacer", "relationships": [
                    {"target": {"type": "nation", "name": "Eastern Empire"}, "relationship_type": "vassal", "strength": 0.6}
                ]}
            ],
            "possible_outcomes": [
                {
                    "actor": {"type": "person", "name": "Zeno"},
                    "action": "recognise Odoacer",
                    "short_term_ramifications": [
                        {"type": "short", "affected_actor": {"type": "person", "name": "Odoacer"}, "ramification": "rules Italy", "probability": 0.8}
                    ],
                    "long_term_ramifications": [
                        {"type": "long", "affected_actor": {"type": "nation", "name": "Italy"}, "ramification": "Ostrogothic kingdom"}
                    ]
                }
            ],
            "narratives": [{"viewpoint": "historian", "text": "The end of the West."}],
            "children": [
                {"year": "unknown", "description": "loading"},
                {"year": "480", "description": "Nepos dies"}
            ]
        }))
        .expect("fixture");
        let tree = Arc::new(root);
        LayoutEngine::default()
            .layout(Some(&tree), &mut PositionCache::new())
            .nodes
    }

    fn render_text(mut sink: TextSink<Vec<u8>>, nodes: &[RenderNode]) -> String {
        sink.render(nodes, &[]).expect("render");
        String::from_utf8(sink.into_inner()).expect("utf8")
    }

    #[test]
    fn text_outline_shows_cards() {
        let output = render_text(TextSink::new(Vec::new()), &sample_nodes());
        let expected = "\
3 nodes, 0 edges
- [root] 476: Romulus Augustulus is deposed
    actors: Odoacer (person)
      Odoacer -> Eastern Empire: vassal (0.60)
    outcome: Zeno: recognise Odoacer
      short: Odoacer: rules Italy [p=0.80]
      long: Italy: Ostrogothic kingdom
    historian: The end of the West.
  - [0] (pending)
  * [1] 480: Nepos dies  (recording history...)
";
        assert_eq!(output, expected);
    }

    #[test]
    fn cue_can_be_hidden() {
        let output = render_text(TextSink::new(Vec::new()).without_cue(), &sample_nodes());
        assert!(!output.contains(NEWEST_CUE));
        assert!(output.contains("- [1] 480: Nepos dies\n"));
    }

    #[test]
    fn unnamed_outcome_actor_reads_loading() {
        let mut node = PivotNode::new("500", "x");
        node.possible_outcomes.push(PivotDecision {
            action: "wait".to_string(),
            ..PivotDecision::default()
        });
        let nodes = LayoutEngine::default()
            .layout(Some(&Arc::new(node)), &mut PositionCache::new())
            .nodes;
        let output = render_text(TextSink::new(Vec::new()).without_cue(), &nodes);
        assert!(output.contains("outcome: Loading: wait"));
    }

    #[test]
    fn json_sink_writes_presentation_model() {
        let nodes = sample_nodes();
        let edges = vec![RenderEdge::new(nodes[0].id.clone(), nodes[1].id.clone())];
        let mut sink = JsonSink::new(Vec::new());
        sink.render(&nodes, &edges).expect("render");

        let value: serde_json::Value =
            serde_json::from_slice(&sink.into_inner()).expect("json output");
        assert_eq!(value["nodes"].as_array().map(Vec::len), Some(3));
        assert_eq!(value["nodes"][0]["id"], "root");
        assert_eq!(value["nodes"][0]["type"], "pivot");
        assert_eq!(value["nodes"][0]["data"]["year"], "476");
        assert_eq!(value["nodes"][2]["data"]["isNewNode"], true);
        assert_eq!(value["edges"][0]["id"], "root->0");
    }

    #[test]
    fn summarize_marks_placeholders() {
        assert_eq!(summarize(&PivotNode::placeholder()), "(pending)");
        assert_eq!(summarize(&PivotNode::new("476", "fall")), "476: fall");
    }
}
