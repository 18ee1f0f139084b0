//! Query runner: planner, scan, group/reduce or assemble, filter, page.

use crate::context::ExecutionContext;
use crate::executor::{FilterExecutor, LimitExecutor, QueryRowAssembler, ReduceGroupEngine};
use crate::options::QueryOptions;
use crate::planner::{QueryMode, RangeQueryPlanner};
use crate::row::QueryRow;
use docview_core::{Error, Result, Value};
use docview_index::KeyCodec;
use docview_storage::ViewIndex;

/// Executes queries against one view's index.
pub struct QueryRunner<'a> {
    ctx: ExecutionContext<'a>,
}

impl<'a> QueryRunner<'a> {
    pub fn new(ctx: ExecutionContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn run(&self, index: &ViewIndex, options: &QueryOptions) -> Result<Vec<QueryRow>> {
        let plan = RangeQueryPlanner::new(self.ctx.collation).plan(options)?;
        let codec = KeyCodec::new(self.ctx.collation);

        let rows = match plan.mode {
            QueryMode::Reduce { group, group_level } => {
                if self.ctx.reducer.is_none() && !group {
                    tracing::warn!(
                        view = self.ctx.view_name,
                        "reduce requested on a view without a reduce function"
                    );
                    return Err(Error::reduce_unavailable(self.ctx.view_name));
                }
                let pairs = index
                    .scan(&plan.request)
                    .map(|(position, value)| -> Result<(Value, Value)> {
                        Ok((codec.decode(&position.key)?, value.clone()))
                    })
                    .collect::<Result<Vec<_>>>()?;
                ReduceGroupEngine::new(self.ctx.reducer, group, group_level)
                    .with_batch_size(self.ctx.reduce_batch_size)
                    .execute(pairs)
            }
            QueryMode::Direct => {
                let mut assembler = QueryRowAssembler::new(codec);
                if options.include_docs {
                    assembler = assembler.with_documents(self.ctx.documents, self.ctx.link_field);
                }
                index
                    .scan(&plan.request)
                    .map(|(position, value)| assembler.assemble(position, value))
                    .collect::<Result<Vec<_>>>()?
            }
        };

        let rows = FilterExecutor::new(options.post_filter.as_ref()).execute(rows);
        Ok(LimitExecutor::new(plan.limit, plan.skip).execute(rows))
    }
}
