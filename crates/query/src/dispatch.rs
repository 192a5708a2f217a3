//! Batch dispatch: replay one named operation across a collection

use std::rc::Rc;

use crate::arg::{Arg, Outcome};
use crate::error::Result;
use crate::handle::{Context, Handle};
use crate::operation::Operation;

/// Runs a named operation once per element, collecting ordered results
#[derive(Clone)]
pub struct BatchDispatcher {
    ctx: Rc<Context>,
}

impl BatchDispatcher {
    pub(crate) fn new(ctx: Rc<Context>) -> Self {
        Self { ctx }
    }

    /// Resolve `operation` by name, then run it on every element of `collection`
    ///
    /// An unknown name fails before the collection is even normalized, so
    /// nothing is touched. The first failing element aborts the rest.
    pub fn dispatch(
        &self,
        collection: impl Into<Arg>,
        operation: &str,
        args: &[Arg],
    ) -> Result<Vec<Outcome>> {
        let operation: Operation = operation.parse()?;
        self.dispatch_op(collection, operation, args)
    }

    pub fn dispatch_op(
        &self,
        collection: impl Into<Arg>,
        operation: Operation,
        args: &[Arg],
    ) -> Result<Vec<Outcome>> {
        let collection = Handle::from_source(&self.ctx, collection.into())?;
        tracing::debug!(
            "Dispatching '{}' over {} elements",
            operation,
            collection.len()
        );

        let mut results = Vec::with_capacity(collection.len());
        for (position, element) in collection.iter().enumerate() {
            match element.invoke(operation, args) {
                Ok(outcome) => results.push(outcome),
                Err(e) => {
                    tracing::warn!(
                        "'{}' failed on element {} of {}: {}",
                        operation,
                        position,
                        collection.len(),
                        e
                    );
                    return Err(e);
                }
            }
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::error::QueryError;
    use crate::testing::fixture;

    const THREE: &str = "<p id='a'></p><p id='b' class='keep'></p><p id='c'></p>";

    #[test]
    fn test_dispatch_add_class_to_all() {
        let (q, _) = fixture(THREE);
        let elements = q.select("p").unwrap();

        let results = q.dispatch(&elements, "addClass", &args!["x"]).unwrap();
        assert_eq!(results.len(), 3);
        for (outcome, expected) in results.into_iter().zip(elements.items()) {
            assert_eq!(outcome.into_handle().unwrap().items(), &[*expected]);
        }
        for element in &elements {
            assert!(element.has_class("x").unwrap());
        }
    }

    #[test]
    fn test_dispatch_reads_in_order() {
        let (q, _) = fixture(THREE);
        let ids: Vec<_> = q
            .dispatch("p", "attr", &args!["id"])
            .unwrap()
            .into_iter()
            .map(|outcome| outcome.into_value().unwrap())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unknown_operation_touches_nothing() {
        let (q, _) = fixture(THREE);
        let before = q.select("p").unwrap().eq(1).unwrap().class_name().unwrap();

        assert!(matches!(
            q.dispatch("p", "doesNotExist", &args!["x"]),
            Err(QueryError::UnknownOperation(_))
        ));
        // The name is checked before the collection, so bad input is never seen
        assert!(matches!(
            q.dispatch(Arg::Null, "doesNotExist", &[]),
            Err(QueryError::UnknownOperation(_))
        ));

        let after = q.select("p").unwrap().eq(1).unwrap().class_name().unwrap();
        assert_eq!(before, after);
        assert_eq!(after, "keep");
    }

    #[test]
    fn test_failure_aborts_remaining_elements() {
        let (q, _) = fixture("<p id='a'><i></i></p><p id='b'></p><p id='c'><i></i></p>");

        let err = q.dispatch("p", "removeChild", &args![0]).unwrap_err();
        assert!(matches!(err, QueryError::ChildNotFound { index: 0, len: 0 }));

        // Applied to the first element, never reached the third
        assert_eq!(q.select("#a").unwrap().children().unwrap().len(), 0);
        assert_eq!(q.select("#c").unwrap().children().unwrap().len(), 1);
    }

    #[test]
    fn test_dispatch_op_with_resolved_operation() {
        let (q, _) = fixture(THREE);
        let dispatcher = q.dispatcher();
        let results = dispatcher.dispatch_op(".keep", Operation::Hide, &[]).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(
            q.select("#b").unwrap().css("display").unwrap().as_deref(),
            Some("none")
        );
        assert_eq!(q.select("#a").unwrap().css("display").unwrap().as_deref(), Some("block"));
    }

    #[test]
    fn test_dispatch_over_empty_collection() {
        let (q, _) = fixture(THREE);
        assert!(q.dispatch("table", "text", &[]).unwrap().is_empty());
    }
}
