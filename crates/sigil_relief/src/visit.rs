//! Visitor traits for markup and stylesheet trees.
//!
//! Rules:
//! 1. Implementers override `visit_*` methods to add behavior.
//! 2. Implementers call the matching `walk_*` function to descend, passing
//!    the state their children should see. Not calling it prunes the subtree.
//! 3. State flows downward only; it is never mutated in place.
//!
//! JavaScript subtrees stop at [`TemplateVisitor::visit_expression`]; they
//! are walked with `oxc_ast_visit` visitors.

use crate::ast::*;
use crate::css::*;

/// Markup traversal with ancestor state.
pub trait TemplateVisitor<'a> {
    type State: Clone;
    type Error;

    fn visit_fragment(
        &mut self,
        fragment: &Fragment<'a>,
        state: &Self::State,
    ) -> Result<(), Self::Error> {
        walk_fragment(self, fragment, state)
    }

    fn visit_node(
        &mut self,
        node: &TemplateNode<'a>,
        state: &Self::State,
    ) -> Result<(), Self::Error> {
        walk_node(self, node, state)
    }

    fn visit_element(
        &mut self,
        element: &Element<'a>,
        state: &Self::State,
    ) -> Result<(), Self::Error> {
        walk_element(self, element, state)
    }

    fn visit_attribute(
        &mut self,
        attribute: &Attribute<'a>,
        state: &Self::State,
    ) -> Result<(), Self::Error> {
        walk_attribute(self, attribute, state)
    }

    fn visit_spread(
        &mut self,
        spread: &SpreadAttribute<'a>,
        state: &Self::State,
    ) -> Result<(), Self::Error> {
        self.visit_expression(&spread.expression, state)
    }

    fn visit_directive(
        &mut self,
        directive: &Directive<'a>,
        state: &Self::State,
    ) -> Result<(), Self::Error> {
        walk_directive(self, directive, state)
    }

    fn visit_text(&mut self, _text: &Text, _state: &Self::State) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_comment(
        &mut self,
        _comment: &Comment,
        _state: &Self::State,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_expression_tag(
        &mut self,
        tag: &ExpressionTag<'a>,
        state: &Self::State,
    ) -> Result<(), Self::Error> {
        self.visit_expression(&tag.expression, state)
    }

    fn visit_block_tag(
        &mut self,
        tag: &BlockTag<'a>,
        state: &Self::State,
    ) -> Result<(), Self::Error> {
        match &tag.expression {
            Some(expression) => self.visit_expression(expression, state),
            None => Ok(()),
        }
    }

    fn visit_expression(
        &mut self,
        _expression: &JsExpression<'a>,
        _state: &Self::State,
    ) -> Result<(), Self::Error> {
        // Leaf node, nothing to walk by default
        Ok(())
    }
}

pub fn walk_fragment<'a, V: TemplateVisitor<'a> + ?Sized>(
    visitor: &mut V,
    fragment: &Fragment<'a>,
    state: &V::State,
) -> Result<(), V::Error> {
    for node in &fragment.nodes {
        visitor.visit_node(node, state)?;
    }
    Ok(())
}

pub fn walk_node<'a, V: TemplateVisitor<'a> + ?Sized>(
    visitor: &mut V,
    node: &TemplateNode<'a>,
    state: &V::State,
) -> Result<(), V::Error> {
    match node {
        TemplateNode::Element(el) => visitor.visit_element(el, state),
        TemplateNode::Text(t) => visitor.visit_text(t, state),
        TemplateNode::Comment(c) => visitor.visit_comment(c, state),
        TemplateNode::ExpressionTag(e) => visitor.visit_expression_tag(e, state),
        TemplateNode::BlockTag(b) => visitor.visit_block_tag(b, state),
    }
}

pub fn walk_element<'a, V: TemplateVisitor<'a> + ?Sized>(
    visitor: &mut V,
    element: &Element<'a>,
    state: &V::State,
) -> Result<(), V::Error> {
    for attribute in &element.attributes {
        match attribute {
            AttributeNode::Attribute(a) => visitor.visit_attribute(a, state)?,
            AttributeNode::Spread(s) => visitor.visit_spread(s, state)?,
            AttributeNode::Directive(d) => visitor.visit_directive(d, state)?,
        }
    }
    visitor.visit_fragment(&element.fragment, state)
}

pub fn walk_attribute<'a, V: TemplateVisitor<'a> + ?Sized>(
    visitor: &mut V,
    attribute: &Attribute<'a>,
    state: &V::State,
) -> Result<(), V::Error> {
    match &attribute.value {
        AttributeValue::True => Ok(()),
        AttributeValue::Expression(tag) => visitor.visit_expression_tag(tag, state),
        AttributeValue::Chunks(chunks) => {
            for chunk in chunks {
                match chunk {
                    ValueChunk::Text(text) => visitor.visit_text(text, state)?,
                    ValueChunk::Expression(tag) => visitor.visit_expression_tag(tag, state)?,
                }
            }
            Ok(())
        }
    }
}

pub fn walk_directive<'a, V: TemplateVisitor<'a> + ?Sized>(
    visitor: &mut V,
    directive: &Directive<'a>,
    state: &V::State,
) -> Result<(), V::Error> {
    match &directive.expression {
        Some(tag) => visitor.visit_expression_tag(tag, state),
        None => Ok(()),
    }
}

/// Stylesheet traversal with ancestor state.
pub trait CssVisitor {
    type State: Clone;
    type Error;

    fn visit_stylesheet(
        &mut self,
        stylesheet: &StyleSheet,
        state: &Self::State,
    ) -> Result<(), Self::Error> {
        for node in &stylesheet.children {
            self.visit_node(node, state)?;
        }
        Ok(())
    }

    fn visit_node(&mut self, node: &CssNode, state: &Self::State) -> Result<(), Self::Error> {
        match node {
            CssNode::Rule(rule) => self.visit_rule(rule, state),
            CssNode::Atrule(atrule) => self.visit_atrule(atrule, state),
            CssNode::Declaration(declaration) => self.visit_declaration(declaration, state),
        }
    }

    fn visit_rule(&mut self, rule: &Rule, state: &Self::State) -> Result<(), Self::Error> {
        walk_rule(self, rule, state)
    }

    fn visit_atrule(&mut self, atrule: &Atrule, state: &Self::State) -> Result<(), Self::Error> {
        match &atrule.block {
            Some(block) => self.visit_block(block, state),
            None => Ok(()),
        }
    }

    fn visit_block(&mut self, block: &Block, state: &Self::State) -> Result<(), Self::Error> {
        for node in &block.children {
            self.visit_node(node, state)?;
        }
        Ok(())
    }

    fn visit_declaration(
        &mut self,
        _declaration: &Declaration,
        _state: &Self::State,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_selector_list(
        &mut self,
        list: &SelectorList,
        state: &Self::State,
    ) -> Result<(), Self::Error> {
        for complex in &list.children {
            self.visit_complex_selector(complex, state)?;
        }
        Ok(())
    }

    fn visit_complex_selector(
        &mut self,
        selector: &ComplexSelector,
        state: &Self::State,
    ) -> Result<(), Self::Error> {
        for relative in &selector.children {
            self.visit_relative_selector(relative, state)?;
        }
        Ok(())
    }

    fn visit_relative_selector(
        &mut self,
        selector: &RelativeSelector,
        state: &Self::State,
    ) -> Result<(), Self::Error> {
        for simple in &selector.selectors {
            self.visit_simple_selector(simple, state)?;
        }
        Ok(())
    }

    fn visit_simple_selector(
        &mut self,
        selector: &SimpleSelector,
        state: &Self::State,
    ) -> Result<(), Self::Error> {
        walk_simple_selector(self, selector, state)
    }
}

pub fn walk_rule<V: CssVisitor + ?Sized>(
    visitor: &mut V,
    rule: &Rule,
    state: &V::State,
) -> Result<(), V::Error> {
    visitor.visit_selector_list(&rule.prelude, state)?;
    visitor.visit_block(&rule.block, state)
}

pub fn walk_simple_selector<V: CssVisitor + ?Sized>(
    visitor: &mut V,
    selector: &SimpleSelector,
    state: &V::State,
) -> Result<(), V::Error> {
    match selector {
        SimpleSelector::PseudoClass(PseudoClassSelector {
            args: Some(args), ..
        }) => visitor.visit_selector_list(args, state),
        _ => Ok(()),
    }
}
