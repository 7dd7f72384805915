//! The linear checkout wizard. Steps only ever advance one at a time, each
//! forward transition re-checks its preconditions, and `previous` only
//! decrements.

use crate::utils::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStep {
    BuyerInfo,
    Summary,
    CustomForm,
    Finalize,
}

/// Everything the gates read. Assembled by the session from auth state, the
/// event snapshot and the answer sheet.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepContext {
    pub authenticated: bool,
    pub profile_complete: bool,
    /// Reseller checkout: an organizer sells on a customer's behalf.
    pub seller_mode: bool,
    /// In seller mode, a customer was selected or newly registered.
    pub customer_ready: bool,
    pub has_custom_form: bool,
    pub form_answers_complete: bool,
}

#[derive(Debug, Clone)]
pub struct CheckoutSteps {
    current: CheckoutStep,
}

impl Default for CheckoutSteps {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckoutSteps {
    pub fn new() -> Self {
        Self {
            current: CheckoutStep::BuyerInfo,
        }
    }

    pub fn current(&self) -> CheckoutStep {
        self.current
    }

    /// Advances one step when the gate for the transition passes. The step is
    /// not changed when the gate fails.
    pub fn next(&mut self, ctx: &StepContext) -> Result<CheckoutStep, AppError> {
        let target = match self.current {
            CheckoutStep::BuyerInfo => {
                if !ctx.authenticated {
                    return Err(AppError::AuthError("Sign in to continue".into()));
                }
                if !ctx.profile_complete {
                    return Err(AppError::ValidationError(
                        "Complete your profile to continue".into(),
                    ));
                }
                if ctx.seller_mode && !ctx.customer_ready {
                    return Err(AppError::ValidationError(
                        "Select or register a customer to continue".into(),
                    ));
                }
                CheckoutStep::Summary
            }
            CheckoutStep::Summary => {
                if ctx.has_custom_form {
                    CheckoutStep::CustomForm
                } else {
                    CheckoutStep::Finalize
                }
            }
            CheckoutStep::CustomForm => {
                if !ctx.form_answers_complete {
                    return Err(AppError::ValidationError(
                        "Answer all required form fields".into(),
                    ));
                }
                CheckoutStep::Finalize
            }
            CheckoutStep::Finalize => {
                return Err(AppError::ValidationError(
                    "Checkout already at the final step".into(),
                ));
            }
        };
        self.current = target;
        Ok(target)
    }

    /// Steps back one position; never skips and never gates.
    pub fn previous(&mut self, ctx: &StepContext) -> CheckoutStep {
        self.current = match self.current {
            CheckoutStep::BuyerInfo | CheckoutStep::Summary => CheckoutStep::BuyerInfo,
            CheckoutStep::CustomForm => CheckoutStep::Summary,
            CheckoutStep::Finalize => {
                if ctx.has_custom_form {
                    CheckoutStep::CustomForm
                } else {
                    CheckoutStep::Summary
                }
            }
        };
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_ctx() -> StepContext {
        StepContext {
            authenticated: true,
            profile_complete: true,
            seller_mode: false,
            customer_ready: false,
            has_custom_form: false,
            form_answers_complete: false,
        }
    }

    #[test]
    fn happy_path_without_form_skips_custom_form() {
        let mut steps = CheckoutSteps::new();
        let ctx = ready_ctx();
        assert_eq!(steps.next(&ctx).unwrap(), CheckoutStep::Summary);
        assert_eq!(steps.next(&ctx).unwrap(), CheckoutStep::Finalize);
    }

    #[test]
    fn form_step_appears_and_gates_on_answers() {
        let mut steps = CheckoutSteps::new();
        let mut ctx = ready_ctx();
        ctx.has_custom_form = true;

        steps.next(&ctx).unwrap();
        assert_eq!(steps.next(&ctx).unwrap(), CheckoutStep::CustomForm);

        assert!(steps.next(&ctx).is_err());
        assert_eq!(steps.current(), CheckoutStep::CustomForm);

        ctx.form_answers_complete = true;
        assert_eq!(steps.next(&ctx).unwrap(), CheckoutStep::Finalize);
    }

    #[test]
    fn buyer_info_gates_on_auth_and_profile() {
        let mut steps = CheckoutSteps::new();
        let mut ctx = ready_ctx();

        ctx.authenticated = false;
        assert!(matches!(steps.next(&ctx), Err(AppError::AuthError(_))));
        assert_eq!(steps.current(), CheckoutStep::BuyerInfo);

        ctx.authenticated = true;
        ctx.profile_complete = false;
        assert!(steps.next(&ctx).is_err());
        assert_eq!(steps.current(), CheckoutStep::BuyerInfo);
    }

    #[test]
    fn seller_mode_requires_a_customer() {
        let mut steps = CheckoutSteps::new();
        let mut ctx = ready_ctx();
        ctx.seller_mode = true;

        assert!(steps.next(&ctx).is_err());
        ctx.customer_ready = true;
        assert_eq!(steps.next(&ctx).unwrap(), CheckoutStep::Summary);
    }

    #[test]
    fn previous_only_decrements() {
        let mut steps = CheckoutSteps::new();
        let mut ctx = ready_ctx();
        ctx.has_custom_form = true;
        ctx.form_answers_complete = true;

        steps.next(&ctx).unwrap();
        steps.next(&ctx).unwrap();
        steps.next(&ctx).unwrap();
        assert_eq!(steps.current(), CheckoutStep::Finalize);

        assert_eq!(steps.previous(&ctx), CheckoutStep::CustomForm);
        assert_eq!(steps.previous(&ctx), CheckoutStep::Summary);
        assert_eq!(steps.previous(&ctx), CheckoutStep::BuyerInfo);
        assert_eq!(steps.previous(&ctx), CheckoutStep::BuyerInfo);
    }

    #[test]
    fn finalize_has_no_next() {
        let mut steps = CheckoutSteps::new();
        let ctx = ready_ctx();
        steps.next(&ctx).unwrap();
        steps.next(&ctx).unwrap();
        assert!(steps.next(&ctx).is_err());
    }
}
