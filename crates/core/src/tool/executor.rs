use scout_model::{ModelTool, ToolCallRequest};
use tracing::Instrument;

use crate::tool::{Error, ToolObject, ToolResult};

/// The result of one tool call.
#[derive(Debug)]
pub struct Outcome {
    pub result: ToolResult,
    pub return_direct: bool,
}

/// Runs tool call requests from the model against the registered tools.
pub struct Executor {
    // Registration order is kept so the model sees tools in a stable order.
    tools: Vec<Box<dyn ToolObject>>,
}

impl Executor {
    pub fn with_tools(tools: Vec<Box<dyn ToolObject>>) -> Self {
        let mut deduped: Vec<Box<dyn ToolObject>> =
            Vec::with_capacity(tools.len());
        for tool in tools {
            if let Some(pos) = deduped.iter().position(|t| t.name() == tool.name())
            {
                warn!("tool {} registered twice, keeping the last", tool.name());
                deduped[pos] = tool;
            } else {
                deduped.push(tool);
            }
        }
        Self { tools: deduped }
    }

    #[inline]
    pub fn definitions(&self) -> Vec<ModelTool> {
        self.tools.iter().map(|tool| tool.definition()).collect()
    }

    pub async fn execute(&self, req: ToolCallRequest) -> Outcome {
        let Some(tool) = self.tools.iter().find(|t| t.name() == req.name)
        else {
            warn!("tool not found: {}", req.name);
            let names: Vec<_> = self.tools.iter().map(|t| t.name()).collect();
            return Outcome {
                result: Err(Error::unknown_tool().with_reason(format!(
                    "{} is not a valid tool, try one of [{}].",
                    req.name,
                    names.join(", ")
                ))),
                return_direct: false,
            };
        };

        let id = req.id;
        trace!("running tool ({id}) with args: {:?}", req.arguments);
        let result = tool
            .execute(req.arguments)
            .instrument(debug_span!("tool execute", name = %req.name))
            .await;
        Outcome {
            result,
            return_direct: tool.return_direct(),
        }
    }
}
