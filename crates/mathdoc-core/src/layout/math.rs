//! Composition of script, fraction and radical boxes.

use super::boxes::{BoxId, BoxKind, Point, Segment};
use super::{Layouter, ScriptOrder};
use crate::ast::Ast;
use crate::node::{MathKind, NodeId, NodeKind};
use mathdoc_fonts::{FontFace, FontStyle};

const MATH: FontStyle = FontStyle::new(FontFace::Math);

impl Layouter {
    /// Box for a math construct, laid out on the main baseline.
    pub(super) fn layout_construct(&mut self, ast: &Ast, id: NodeId, kind: MathKind) -> BoxId {
        let lists = ast.children(id);
        let first = lists.first().copied();
        let second = lists.get(1).copied();

        match kind {
            MathKind::Script => {
                let sub = self.layout_list(ast, first, MATH.to_script());
                let sup = self.layout_list(ast, second, MATH.to_script());
                self.compose_script(id, sub, sup)
            }
            MathKind::Fraction => {
                let numerator = self.layout_list(ast, first, MATH);
                let denominator = self.layout_list(ast, second, MATH);
                self.compose_fraction(id, numerator, denominator)
            }
            MathKind::Root => {
                let radicand = self.layout_list(ast, first, MATH);
                let degree = self.layout_list(ast, second, MATH.to_script());
                self.compose_root(id, radicand, degree)
            }
        }
    }

    fn layout_list(&mut self, ast: &Ast, list: Option<NodeId>, style: FontStyle) -> BoxId {
        let list_box = self.arena.push(BoxKind::MathList, list);
        let Some(list) = list else {
            return list_box;
        };
        self.node_boxes.insert(list, list_box);

        let mut children = Vec::new();
        for &child in ast.children(list) {
            let id = match ast.kind(child) {
                Some(NodeKind::Char(data)) => self.glyph(child, data.content(), style),
                Some(NodeKind::Placeholder) => self.placeholder(child, style),
                Some(NodeKind::End) => self.sentinel(child, BoxKind::End, style),
                _ => continue,
            };
            children.push(id);
        }
        self.arena.adopt(list_box, children);
        self.arena.align_row(list_box);
        list_box
    }

    /// Height of the math axis above the baseline: half of a space glyph box.
    fn axis(&mut self) -> f32 {
        (self.fonts.ascent(MATH) + self.fonts.descent(MATH)) / 2.0
    }

    fn is_empty_list(&self, id: BoxId) -> bool {
        self.arena.get(id).is_some_and(|b| b.children.len() <= 1)
    }

    /// Give an empty branch the height of its non-empty sibling.
    fn equalize(&mut self, a: BoxId, b: BoxId) {
        let (source, target) = match (self.is_empty_list(a), self.is_empty_list(b)) {
            (true, false) => (b, a),
            (false, true) => (a, b),
            _ => return,
        };
        let Some((height, descent)) = self.arena.get(source).map(|s| (s.height, s.descent)) else {
            return;
        };
        if let Some(target) = self.arena.get_mut(target) {
            target.height = height;
            target.descent = descent;
        }
    }

    fn size(&self, id: BoxId) -> (f32, f32) {
        self.arena
            .get(id)
            .map(|b| (b.width, b.height))
            .unwrap_or_default()
    }

    fn place(&mut self, id: BoxId, x: f32, y: f32) {
        if let Some(b) = self.arena.get_mut(id) {
            b.x = x;
            b.y = y;
        }
    }

    fn finish(
        &mut self,
        node: NodeId,
        kind: BoxKind,
        children: Vec<BoxId>,
        (width, height, descent): (f32, f32, f32),
    ) -> BoxId {
        let id = self.arena.push(kind, Some(node));
        self.arena.adopt(id, children);
        if let Some(b) = self.arena.get_mut(id) {
            b.width = width;
            b.height = height;
            b.descent = descent;
        }
        self.node_boxes.insert(node, id);
        id
    }

    fn compose_script(&mut self, node: NodeId, sub: BoxId, sup: BoxId) -> BoxId {
        self.equalize(sub, sup);
        let (upper, lower) = match self.config.script_order {
            ScriptOrder::SuperscriptTop => (sup, sub),
            ScriptOrder::SubscriptTop => (sub, sup),
        };
        let (upper_width, upper_height) = self.size(upper);
        let (lower_width, lower_height) = self.size(lower);
        let gutter = self.config.script_gutter;

        self.place(upper, gutter, 0.0);
        self.place(lower, gutter, upper_height);

        // The junction between the branches sits on the math axis.
        let axis = self.axis();
        let height = upper_height + lower_height;
        let descent = -(lower_height - axis);
        let width = upper_width.max(lower_width) + gutter;
        self.finish(node, BoxKind::Script, vec![sub, sup], (width, height, descent))
    }

    fn compose_fraction(&mut self, node: NodeId, numerator: BoxId, denominator: BoxId) -> BoxId {
        self.equalize(numerator, denominator);
        let (num_width, num_height) = self.size(numerator);
        let (den_width, den_height) = self.size(denominator);
        let padding = self.config.fraction_padding;
        let gap = self.config.fraction_gap;
        let inner = num_width.max(den_width);
        let width = inner + 2.0 * padding;

        self.place(numerator, padding + (inner - num_width) / 2.0, 0.0);
        self.place(denominator, padding + (inner - den_width) / 2.0, num_height + gap);

        let rule_y = num_height + gap / 2.0;
        let rule = Segment {
            from: Point::new(0.0, rule_y),
            to: Point::new(width, rule_y),
        };
        let height = num_height + gap + den_height;
        let descent = -(height / 2.0 - self.axis());
        self.finish(
            node,
            BoxKind::Fraction { rule },
            vec![numerator, denominator],
            (width, height, descent),
        )
    }

    fn compose_root(&mut self, node: NodeId, radicand: BoxId, degree: BoxId) -> BoxId {
        let (rad_width, rad_height) = self.size(radicand);
        let (deg_width, deg_height) = self.size(degree);
        let rad_descent = self.arena.get(radicand).map_or(0.0, |b| b.descent);
        let stroke_width = self.config.radical_width;
        let padding = self.config.radical_padding;
        let stroke_height = rad_height + padding;

        // The degree ends where the stroke bottoms out and stays above its left tick.
        let (x0, top) = if self.is_empty_list(degree) {
            (0.0, 0.0)
        } else {
            (
                (deg_width - 0.35 * stroke_width).max(0.0),
                (deg_height - 0.55 * stroke_height).max(0.0),
            )
        };
        let degree_x = (x0 + 0.35 * stroke_width - deg_width).max(0.0);
        let degree_y = (top + 0.55 * stroke_height - deg_height).max(0.0);
        self.place(degree, degree_x, degree_y);
        self.place(radicand, x0 + stroke_width + padding / 2.0, top + padding);

        let end = x0 + stroke_width + rad_width + padding;
        let stroke = [
            Point::new(x0, top + 0.6 * stroke_height),
            Point::new(x0 + 0.35 * stroke_width, top + stroke_height),
            Point::new(x0 + stroke_width, top),
            Point::new(end, top),
        ];
        self.finish(
            node,
            BoxKind::Root { stroke },
            vec![radicand, degree],
            (end, top + stroke_height, rad_descent),
        )
    }
}
